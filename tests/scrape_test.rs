use rss_reader::scrape::extract_page;

#[test]
fn prefers_og_image() {
    let html = r#"<html><head>
        <meta property="og:image" content="http://example.com/og.jpg">
        <meta name="twitter:image" content="http://example.com/tw.jpg">
    </head><body><img src="/inline.png"></body></html>"#;

    let page = extract_page(html, "http://example.com/story");
    assert_eq!(page.top_image.as_deref(), Some("http://example.com/og.jpg"));
}

#[test]
fn falls_back_to_twitter_image_then_first_img() {
    let html = r#"<html><head>
        <meta name="twitter:image" content="http://example.com/tw.jpg">
    </head><body></body></html>"#;
    let page = extract_page(html, "http://example.com/story");
    assert_eq!(page.top_image.as_deref(), Some("http://example.com/tw.jpg"));

    let html = r#"<html><body><img src="/images/photo.png" alt=""></body></html>"#;
    let page = extract_page(html, "http://example.com/story");
    assert_eq!(
        page.top_image.as_deref(),
        Some("http://example.com/images/photo.png")
    );
}

#[test]
fn no_image_yields_none() {
    let page = extract_page("<html><body><p>text only</p></body></html>", "http://example.com/");
    assert!(page.top_image.is_none());
}

#[test]
fn body_text_comes_from_article_paragraphs() {
    let html = r#"<html><body>
        <p>Navigation boilerplate</p>
        <article>
            <p>First paragraph of the story.</p>
            <p>Second   paragraph, with   odd spacing.</p>
        </article>
    </body></html>"#;

    let page = extract_page(html, "http://example.com/story");
    assert_eq!(
        page.text,
        "First paragraph of the story.\n\nSecond paragraph, with odd spacing."
    );
}

#[test]
fn body_text_falls_back_to_all_paragraphs() {
    let html = r#"<html><body>
        <p>Only paragraph on the page.</p>
    </body></html>"#;

    let page = extract_page(html, "http://example.com/story");
    assert_eq!(page.text, "Only paragraph on the page.");
}

#[test]
fn page_without_paragraphs_yields_empty_text() {
    let page = extract_page("<html><body><div>divs only</div></body></html>", "http://example.com/");
    assert!(page.text.is_empty());
}
