//! Integration tests: configured jobs run against a mock site and write real
//! feed files.
//!
//! Each test starts its own wiremock server and output directory.

use rss_creator::jobs::{JobRegistry, JobRunner};
use rss_creator::models::Config;
use tempfile::TempDir;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

async fn serve(server: &MockServer, route: &str, content_type: &str, body: &str) {
    Mock::given(method("GET"))
        .and(path(route))
        .respond_with(
            ResponseTemplate::new(200)
                .insert_header("content-type", content_type)
                .set_body_string(body),
        )
        .mount(server)
        .await;
}

fn article(title: &str, published: &str) -> String {
    format!(
        r#"<html><head>
             <meta property="og:title" content="{title}">
             <meta property="og:description" content="Summary of {title}">
             <meta property="article:published_time" content="{published}">
           </head><body><h1>{title}</h1></body></html>"#
    )
}

fn read_feed(dir: &TempDir, name: &str) -> feed_rs::model::Feed {
    let bytes = std::fs::read(dir.path().join(name)).unwrap();
    feed_rs::parser::parse(bytes.as_slice()).unwrap()
}

// ============================================================================
// site_crawl
// ============================================================================

#[tokio::test]
async fn test_site_crawl_end_to_end() {
    let server = MockServer::start().await;
    let base = server.uri();

    serve(
        &server,
        "/news",
        "text/html",
        r#"<a href="/news/minimax-m25">M2.5</a>
           <a href="/news/en">English</a>
           <a href="/news/ImageObject">schema</a>
           <script type="application/json">{"list":["/news/minimax-agent"]}</script>"#,
    )
    .await;
    serve(
        &server,
        "/robots.txt",
        "text/plain",
        &format!("User-agent: *\nSitemap: {base}/sitemap-news.xml\n"),
    )
    .await;
    serve(
        &server,
        "/sitemap-news.xml",
        "application/xml",
        &format!(
            "<urlset><url><loc>{base}/news/speech-02</loc></url>\
             <url><loc>{base}/news/minimax-m25?ref=sitemap</loc></url></urlset>"
        ),
    )
    .await;
    serve(
        &server,
        "/news/minimax-m25",
        "text/html",
        &article("MiniMax M2.5", "2026-02-12T09:30:00+08:00"),
    )
    .await;
    serve(
        &server,
        "/news/minimax-agent",
        "text/html",
        &article("MiniMax Agent", "2026-02-10T00:00:00Z"),
    )
    .await;
    serve(
        &server,
        "/news/speech-02",
        "text/html",
        &article("Speech 02", "2026-01-20T00:00:00Z"),
    )
    .await;

    let config = Config::parse(&format!(
        r#"
        [[jobs]]
        type = "site_crawl"
        name = "MiniMax News"
        output = "minimax_blog.xml"
        site_url = "{base}"

        [jobs.options]
        retries = 0
        timeout = 5
        "#
    ))
    .unwrap();

    let dir = TempDir::new().unwrap();
    let report = JobRunner::new(JobRegistry::builtin(), dir.path())
        .run(&config.jobs)
        .await;
    assert!(report.all_succeeded(), "{:?}", report.results);

    let feed = read_feed(&dir, "minimax_blog.xml");
    let links: Vec<_> = feed
        .entries
        .iter()
        .map(|e| e.links[0].href.clone())
        .collect();
    assert_eq!(
        links,
        vec![
            format!("{base}/news/minimax-m25"),
            format!("{base}/news/minimax-agent"),
            format!("{base}/news/speech-02"),
        ]
    );
    assert_eq!(
        feed.entries[0].title.as_ref().unwrap().content,
        "MiniMax M2.5"
    );
    assert!(feed.entries[0].published.is_some());
}

#[tokio::test]
async fn test_site_crawl_without_candidates_fails() {
    let server = MockServer::start().await;
    serve(&server, "/news", "text/html", "<p>nothing here</p>").await;

    let config = Config::parse(&format!(
        "[[jobs]]\ntype = \"site_crawl\"\nsite_url = \"{}\"\n[jobs.options]\nretries = 0\n",
        server.uri()
    ))
    .unwrap();

    let dir = TempDir::new().unwrap();
    let report = JobRunner::new(JobRegistry::builtin(), dir.path())
        .run(&config.jobs)
        .await;

    assert_eq!(report.outcomes().get("site_crawl"), Some(&false));
    assert!(report.results[0].details.contains("no candidate URLs"));
}

// ============================================================================
// Mixed batch
// ============================================================================

#[tokio::test]
async fn test_batch_isolates_failures() {
    let server = MockServer::start().await;
    let base = server.uri();

    serve(
        &server,
        "/blog/",
        "text/html",
        r#"<div class="post"><h3>Hello</h3><a href="hello">read</a>
             <time datetime="2026-03-01T08:00:00Z">Mar 1</time></div>
           <div class="post"><h3>World</h3><a href="/blog/world">read</a></div>"#,
    )
    .await;
    serve(
        &server,
        "/feed.xml",
        "application/rss+xml",
        r#"<?xml version="1.0"?><rss version="2.0"><channel>
             <title>Upstream</title><link>https://upstream.test</link><description>All</description>
             <item><title>Kept</title><link>https://upstream.test/kept</link><category>Research</category></item>
             <item><title>Dropped</title><link>https://upstream.test/dropped</link><category>Sales</category></item>
           </channel></rss>"#,
    )
    .await;
    serve(
        &server,
        "/api/posts",
        "application/json",
        r#"{"posts":[
             {"title":"Older","url":"/r/older","date":"2026-01-01","tags":["release"]},
             {"title":"Newer","url":"/r/newer","date":"2026-02-01","tags":["release"]}
           ]}"#,
    )
    .await;

    let config = Config::parse(&format!(
        r#"
        [[jobs]]
        type = "selector_scrape"
        name = "Blog"
        url = "{base}/blog/"
        [jobs.selectors]
        items = "div.post"
        title = "h3"
        date = "time"

        [[jobs]]
        type = "no_such_type"
        name = "Broken"

        [[jobs]]
        type = "rss_filter"
        name = "Research"
        source_url = "{base}/feed.xml"
        categories = ["research"]

        [[jobs]]
        type = "json_api"
        name = "Releases"
        api_url = "{base}/api/posts"
        tag = "release"

        [[jobs]]
        type = "selector_scrape"
        name = "Disabled"
        enabled = false
        url = "{base}/never"
        [jobs.selectors]
        items = "li"
        "#
    ))
    .unwrap();

    let dir = TempDir::new().unwrap();
    let report = JobRunner::new(JobRegistry::builtin(), dir.path())
        .run(&config.jobs)
        .await;

    let outcomes = report.outcomes();
    assert_eq!(outcomes.len(), 4);
    assert_eq!(outcomes["Blog"], true);
    assert_eq!(outcomes["Broken"], false);
    assert_eq!(outcomes["Research"], true);
    assert_eq!(outcomes["Releases"], true);
    assert!(!outcomes.contains_key("Disabled"));
    assert_eq!(report.success_count(), 3);

    let blog = read_feed(&dir, "blog.xml");
    assert_eq!(blog.entries.len(), 2);
    assert_eq!(blog.entries[0].links[0].href, format!("{base}/blog/hello"));

    let research = read_feed(&dir, "research.xml");
    assert_eq!(research.entries.len(), 1);
    assert_eq!(
        research.title.as_ref().unwrap().content,
        "Upstream - filtered"
    );

    let releases = read_feed(&dir, "releases.xml");
    let titles: Vec<_> = releases
        .entries
        .iter()
        .map(|e| e.title.as_ref().unwrap().content.clone())
        .collect();
    assert_eq!(titles, vec!["Newer", "Older"]);
}
