use hostcrawl::{HtmlParser, Parser};
use url::Url;

fn url(input: &str) -> Url {
    Url::parse(input).expect("test url")
}

fn as_strings(urls: &[Url]) -> Vec<&str> {
    urls.iter().map(Url::as_str).collect()
}

const BODY: &str = r#"
	<html>
		<head>
			<link rel="stylesheet" href="/main.css">
			<script src="bundle.js"></script>
		</head>
		<body>
			<a href="/articles/1" class="articles"><span class="divider">Articles</span></a>

			<a href="https://mydomain.com/account">Account</a>
			<a href='http://mydomain.com/images'></a>
			<a href="//www.youtube.com/?"></a>
			<a href=""></a>
			<a href="/home">
				<img src="/home.jpg" />
			</a>

			<img src='http://imgur.com/abcdef.jpg' class="img" />
			<script async src="//www.google-analytics.com/analytics.js"></script>
		</body>
	</html>
"#;

#[test]
fn test_parse_links() {
    let parser = HtmlParser::new();
    let root = url("https://mydomain.com/page/1");

    let (links, _) = parser.parse(&root, BODY.as_bytes());

    assert_eq!(
        as_strings(&links),
        vec![
            "https://mydomain.com/articles/1",
            "https://mydomain.com/account",
            "http://mydomain.com/images",
            "https://www.youtube.com/?",
            "https://mydomain.com/home",
        ]
    );
}

#[test]
fn test_parse_assets() {
    let parser = HtmlParser::new();
    let root = url("https://mydomain.com/page/1");

    let (_, assets) = parser.parse(&root, BODY.as_bytes());

    assert_eq!(
        as_strings(&assets),
        vec![
            "https://mydomain.com/main.css",
            "https://mydomain.com/page/bundle.js",
            "https://mydomain.com/home.jpg",
            "http://imgur.com/abcdef.jpg",
            "https://www.google-analytics.com/analytics.js",
        ]
    );
}

#[test]
fn test_parse_relative_urls() {
    let parser = HtmlParser::new();
    let body = r#"<html><body><a href="issues/351">351</a></body></html>"#;

    let base = url("https://mydomain.com/issues");
    let (links, _) = parser.parse(&base, body.as_bytes());

    assert_eq!(as_strings(&links), vec!["https://mydomain.com/issues/351"]);
}

#[test]
fn test_img_without_self_closing_slash_is_captured() {
    let parser = HtmlParser::new();
    let body = r#"<html><body><img src="/logo.png"></body></html>"#;

    let base = url("https://mydomain.com/");
    let (links, assets) = parser.parse(&base, body.as_bytes());

    assert!(links.is_empty());
    assert_eq!(as_strings(&assets), vec!["https://mydomain.com/logo.png"]);
}

#[test]
fn test_malformed_urls_are_dropped() {
    let parser = HtmlParser::new();
    let body = r#"<html><body>
        <a href="http://[">broken</a>
        <a href="/fine">fine</a>
    </body></html>"#;

    let base = url("https://mydomain.com/");
    let (links, _) = parser.parse(&base, body.as_bytes());

    assert_eq!(as_strings(&links), vec!["https://mydomain.com/fine"]);
}

#[test]
fn test_empty_attributes_are_dropped() {
    let parser = HtmlParser::new();
    let body = r#"<html><body>
        <a href="">nowhere</a>
        <script src=""></script>
        <img src="" />
    </body></html>"#;

    let base = url("https://mydomain.com/");
    let (links, assets) = parser.parse(&base, body.as_bytes());

    assert!(links.is_empty());
    assert!(assets.is_empty());
}

#[test]
fn test_duplicates_are_preserved_in_document_order() {
    let parser = HtmlParser::new();
    let body = r#"<html><body>
        <a href="/a">one</a>
        <a href="/b">two</a>
        <a href="/a">one again</a>
    </body></html>"#;

    let base = url("https://mydomain.com/");
    let (links, _) = parser.parse(&base, body.as_bytes());

    assert_eq!(
        as_strings(&links),
        vec![
            "https://mydomain.com/a",
            "https://mydomain.com/b",
            "https://mydomain.com/a",
        ]
    );
}

#[test]
fn test_invalid_utf8_is_tolerated() {
    let parser = HtmlParser::new();
    let mut body = b"<html><body><a href=\"/ok\">ok</a>".to_vec();
    body.extend_from_slice(&[0xff, 0xfe, 0xfd]);
    body.extend_from_slice(b"</body></html>");

    let base = url("https://mydomain.com/");
    let (links, _) = parser.parse(&base, &body);

    assert_eq!(as_strings(&links), vec!["https://mydomain.com/ok"]);
}
