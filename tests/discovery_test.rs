use rss_reader::discovery::{extract_feed_candidates, set_url_scheme, with_rss_suffix};

#[test]
fn schemeless_urls_are_coerced_to_http() {
    assert_eq!(
        set_url_scheme("example.com", "http").unwrap(),
        "http://example.com/"
    );
}

#[test]
fn existing_schemes_are_replaced() {
    assert_eq!(
        set_url_scheme("https://example.com/feed", "http").unwrap(),
        "http://example.com/feed"
    );
}

#[test]
fn rss_suffix_respects_trailing_slash() {
    assert_eq!(with_rss_suffix("http://example.com"), "http://example.com/rss");
    assert_eq!(with_rss_suffix("http://example.com/"), "http://example.com/rss");
}

#[test]
fn finds_alternate_links_with_feed_types() {
    let html = r#"<html><head>
        <link rel="alternate" type="application/rss+xml" href="/feeds/all.rss">
        <link rel="alternate" type="application/atom+xml" href="http://example.com/atom.xml">
        <link rel="alternate" type="text/html" href="/mobile">
        <link rel="stylesheet" href="/style.css">
    </head><body></body></html>"#;

    let candidates = extract_feed_candidates(html, "http://example.com/");

    assert!(candidates.contains(&"http://example.com/feeds/all.rss".to_string()));
    assert!(candidates.contains(&"http://example.com/atom.xml".to_string()));
    assert!(!candidates.iter().any(|c| c.contains("mobile")));
    assert!(!candidates.iter().any(|c| c.contains("style.css")));
}

#[test]
fn finds_feed_looking_anchors() {
    let html = r#"<html><body>
        <a href="/rss">Subscribe</a>
        <a href="/about">About</a>
        <a href="http://example.com/posts.xml">Posts</a>
    </body></html>"#;

    let candidates = extract_feed_candidates(html, "http://example.com/");

    assert!(candidates.contains(&"http://example.com/rss".to_string()));
    assert!(candidates.contains(&"http://example.com/posts.xml".to_string()));
    assert!(!candidates.iter().any(|c| c.contains("about")));
}

#[test]
fn duplicate_candidates_are_collapsed() {
    let html = r#"<html><head>
        <link rel="alternate" type="application/rss+xml" href="/rss">
    </head><body>
        <a href="/rss">Subscribe</a>
    </body></html>"#;

    let candidates = extract_feed_candidates(html, "http://example.com/");
    assert_eq!(candidates, vec!["http://example.com/rss".to_string()]);
}

#[test]
fn page_without_feeds_yields_nothing() {
    let html = "<html><body><p>No feeds here.</p></body></html>";
    assert!(extract_feed_candidates(html, "http://example.com/").is_empty());
}
