//! Timeline page HTML parser.
//!
//! Understands the markup served by Nitter-style front ends: each tweet is a
//! `div.timeline-item` with a `a.tweet-link` pointing at `/<user>/status/<id>`.

use std::collections::BTreeMap;

use regex::Regex;
use scraper::{ElementRef, Html, Selector};

use super::types::{Media, MediaType, QuotedTweet, Tweet};

/// Icon class to stat name, checked in this order.
const STAT_ICONS: &[(&str, &str)] = &[
    ("icon-comment", "replies"),
    ("icon-retweet", "retweets"),
    ("icon-quote", "quotes"),
    ("icon-heart", "likes"),
    ("icon-play", "views"),
];

struct Selectors {
    item: Selector,
    link: Selector,
    retweet_header: Selector,
    pinned: Selector,
    header: Selector,
    fullname: Selector,
    username: Selector,
    date: Selector,
    anchor: Selector,
    content: Selector,
    quote: Selector,
    name_row: Selector,
    quote_text: Selector,
    quote_link: Selector,
    attachments: Selector,
    image: Selector,
    video: Selector,
    stat: Selector,
    stat_icon: Selector,
}

impl Selectors {
    fn new() -> Self {
        let parse = |s: &str| Selector::parse(s).expect("Invalid timeline selector");
        Self {
            item: parse("div.timeline-item"),
            link: parse("a.tweet-link"),
            retweet_header: parse("div.retweet-header"),
            pinned: parse("div.pinned"),
            header: parse("div.tweet-header"),
            fullname: parse("a.fullname"),
            username: parse("a.username"),
            date: parse("span.tweet-date"),
            anchor: parse("a"),
            content: parse("div.tweet-content"),
            quote: parse("div.quote"),
            name_row: parse("div.tweet-name-row"),
            quote_text: parse("div.quote-text"),
            quote_link: parse("a.quote-link"),
            attachments: parse("div.attachments"),
            image: parse("img"),
            video: parse("div.video-container"),
            stat: parse("span.tweet-stat"),
            stat_icon: parse("span[class*='icon-']"),
        }
    }
}

/// Parser for timeline page HTML.
pub struct TimelineParser;

impl TimelineParser {
    /// Parse every timeline item on the page, in page order.
    ///
    /// Items without a recognisable status link are still returned, with `id = None`.
    pub fn parse(html: &str) -> Vec<Tweet> {
        let document = Html::parse_document(html);
        let sel = Selectors::new();

        let items: Vec<_> = document.select(&sel.item).collect();
        if items.is_empty() {
            tracing::warn!(
                "No timeline items found in HTML (selector: div.timeline-item). \
                 The account may be empty or the front end markup may have changed."
            );
            return Vec::new();
        }

        let tweets: Vec<Tweet> = items
            .into_iter()
            .map(|item| Self::parse_item(item, &sel))
            .collect();

        tracing::debug!(count = tweets.len(), "Parsed timeline items");
        tweets
    }

    fn parse_item(item: ElementRef<'_>, sel: &Selectors) -> Tweet {
        let mut tweet = Tweet::default();

        if let Some(href) = item
            .select(&sel.link)
            .next()
            .and_then(|a| a.value().attr("href"))
        {
            tweet.url = Some(href.to_string());
            tweet.id = Self::extract_tweet_id(href);
            if tweet.id.is_none() {
                tracing::debug!(href, "Tweet link has no status id");
            }
        }

        if let Some(header) = item.select(&sel.retweet_header).next() {
            tweet.is_retweet = true;
            tweet.retweet_info = non_empty(element_text(header));
        }
        tweet.is_pinned = item.select(&sel.pinned).next().is_some();

        if let Some(header) = item.select(&sel.header).next() {
            tweet.author = first_text(header, &sel.fullname);
            tweet.username = first_text(header, &sel.username);
            if let Some(date) = header.select(&sel.date).next() {
                tweet.display_date = non_empty(element_text(date));
                tweet.full_date = date
                    .select(&sel.anchor)
                    .next()
                    .and_then(|a| a.value().attr("title"))
                    .map(ToString::to_string);
            }
        }

        if let Some(content) = item.select(&sel.content).next() {
            tweet.text = element_text(content);
        }

        tweet.quoted_tweet = Self::parse_quote(item, sel);
        tweet.media = Self::parse_media(item, sel);
        tweet.stats = Self::parse_stats(item, sel);
        tweet
    }

    fn parse_quote(item: ElementRef<'_>, sel: &Selectors) -> Option<QuotedTweet> {
        let quote = item.select(&sel.quote).next()?;
        let mut quoted = QuotedTweet::default();

        if let Some(row) = quote.select(&sel.name_row).next() {
            quoted.author = first_text(row, &sel.fullname);
            quoted.username = first_text(row, &sel.username);
            quoted.date = first_text(row, &sel.date);
        }
        quoted.text = first_text(quote, &sel.quote_text);
        quoted.link = quote
            .select(&sel.quote_link)
            .next()
            .and_then(|a| a.value().attr("href"))
            .map(ToString::to_string);

        Some(quoted)
    }

    fn parse_media(item: ElementRef<'_>, sel: &Selectors) -> Vec<Media> {
        let Some(attachments) = item.select(&sel.attachments).next() else {
            return Vec::new();
        };

        let mut media: Vec<Media> = attachments
            .select(&sel.image)
            .filter_map(|img| {
                let src = img.value().attr("src")?;
                Some(Media {
                    media_type: MediaType::Image,
                    src: src.to_string(),
                    alt: img.value().attr("alt").map(ToString::to_string),
                })
            })
            .collect();

        media.extend(attachments.select(&sel.video).filter_map(|video| {
            let thumb = video.select(&sel.image).next()?.value().attr("src")?;
            Some(Media {
                media_type: MediaType::Video,
                src: thumb.to_string(),
                alt: None,
            })
        }));

        media
    }

    fn parse_stats(item: ElementRef<'_>, sel: &Selectors) -> BTreeMap<String, String> {
        let number = Regex::new(r"[\d,]+").expect("Invalid stat number regex");
        let mut stats = BTreeMap::new();

        for stat in item.select(&sel.stat) {
            let Some(icon) = stat.select(&sel.stat_icon).next() else {
                continue;
            };
            let classes: Vec<&str> = icon.value().classes().collect();
            let Some((_, name)) = STAT_ICONS
                .iter()
                .find(|(class, _)| classes.contains(class))
            else {
                continue;
            };

            let text = element_text(stat);
            if let Some(m) = number.find(&text) {
                stats.insert((*name).to_string(), m.as_str().replace(',', ""));
            }
        }

        stats
    }

    /// Extract the numeric tweet ID from a status link (full URL or relative path).
    ///
    /// `/user/status/123#m` and `https://x.com/user/status/123?s=20` both yield `123`.
    pub fn extract_tweet_id(url: &str) -> Option<String> {
        let re = Regex::new(r"/status/(\d+)").expect("Invalid status regex");
        re.captures(url)
            .and_then(|c| c.get(1))
            .map(|m| m.as_str().to_string())
    }
}

/// Collapse an element's text nodes into a single whitespace-normalised string.
fn element_text(el: ElementRef<'_>) -> String {
    el.text()
        .flat_map(str::split_whitespace)
        .collect::<Vec<_>>()
        .join(" ")
}

fn first_text(scope: ElementRef<'_>, selector: &Selector) -> Option<String> {
    scope
        .select(selector)
        .next()
        .and_then(|el| non_empty(element_text(el)))
}

fn non_empty(text: String) -> Option<String> {
    if text.is_empty() {
        None
    } else {
        Some(text)
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    pub(crate) const TIMELINE_HTML: &str = r##"
<html><body><div class="timeline">
  <div class="timeline-item">
    <a class="tweet-link" href="/acme/status/1001#m"></a>
    <div class="pinned"><span class="icon-pin"></span> Pinned Tweet</div>
    <div class="tweet-header">
      <a class="fullname" href="/acme">Acme Corp</a>
      <a class="username" href="/acme">@acme</a>
      <span class="tweet-date"><a href="/acme/status/1001#m" title="Mar 3, 2025 · 4:05 PM UTC">Mar 3</a></span>
    </div>
    <div class="tweet-content media-body">Excited to announce our
      new <a href="/search">rocket</a></div>
    <div class="attachments">
      <div class="gallery-row"><img src="/pic/media%2Fabc.jpg" alt="launch pad"></div>
      <div class="video-container"><img src="/pic/thumb.jpg"></div>
    </div>
    <div class="tweet-stats">
      <span class="tweet-stat"><div class="icon-container"><span class="icon-comment"></span> 1,204</div></span>
      <span class="tweet-stat"><div class="icon-container"><span class="icon-retweet"></span> 310</div></span>
      <span class="tweet-stat"><div class="icon-container"><span class="icon-heart"></span> 2,848</div></span>
    </div>
  </div>
  <div class="timeline-item">
    <a class="tweet-link" href="/other/status/1002#m"></a>
    <div class="retweet-header"><span class="icon-retweet"></span> Acme Corp retweeted</div>
    <div class="tweet-header">
      <a class="fullname" href="/other">Other</a>
      <a class="username" href="/other">@other</a>
    </div>
    <div class="tweet-content media-body">lol good morning</div>
    <div class="quote">
      <a class="quote-link" href="/third/status/999#m"></a>
      <div class="tweet-name-row">
        <a class="fullname" href="/third">Third</a>
        <a class="username" href="/third">@third</a>
        <span class="tweet-date">Feb 1</span>
      </div>
      <div class="quote-text">quoted words</div>
    </div>
  </div>
  <div class="timeline-item">
    <a class="tweet-link" href="/acme/bogus"></a>
    <div class="tweet-content">no id here</div>
  </div>
</div></body></html>
"##;

    #[test]
    fn test_parse_timeline_items() {
        let tweets = TimelineParser::parse(TIMELINE_HTML);
        assert_eq!(tweets.len(), 3);

        let first = &tweets[0];
        assert_eq!(first.id.as_deref(), Some("1001"));
        assert_eq!(first.url.as_deref(), Some("/acme/status/1001#m"));
        assert!(first.is_pinned);
        assert!(!first.is_retweet);
        assert_eq!(first.author.as_deref(), Some("Acme Corp"));
        assert_eq!(first.username.as_deref(), Some("@acme"));
        assert_eq!(first.display_date.as_deref(), Some("Mar 3"));
        assert_eq!(
            first.full_date.as_deref(),
            Some("Mar 3, 2025 · 4:05 PM UTC")
        );
        assert_eq!(first.text, "Excited to announce our new rocket");
    }

    #[test]
    fn test_parse_media_and_stats() {
        let tweets = TimelineParser::parse(TIMELINE_HTML);
        let first = &tweets[0];

        assert_eq!(first.media.len(), 3);
        assert_eq!(first.media[0].media_type, MediaType::Image);
        assert_eq!(first.media[0].alt.as_deref(), Some("launch pad"));
        assert_eq!(first.media[2].media_type, MediaType::Video);
        assert_eq!(first.media[2].src, "/pic/thumb.jpg");

        assert_eq!(first.stats.get("replies").map(String::as_str), Some("1204"));
        assert_eq!(first.stats.get("retweets").map(String::as_str), Some("310"));
        assert_eq!(first.stats.get("likes").map(String::as_str), Some("2848"));
        assert!(!first.stats.contains_key("views"));
    }

    #[test]
    fn test_parse_retweet_and_quote() {
        let tweets = TimelineParser::parse(TIMELINE_HTML);
        let second = &tweets[1];

        assert!(second.is_retweet);
        assert_eq!(second.retweet_info.as_deref(), Some("Acme Corp retweeted"));
        let quote = second.quoted_tweet.as_ref().unwrap();
        assert_eq!(quote.author.as_deref(), Some("Third"));
        assert_eq!(quote.username.as_deref(), Some("@third"));
        assert_eq!(quote.date.as_deref(), Some("Feb 1"));
        assert_eq!(quote.text.as_deref(), Some("quoted words"));
        assert_eq!(quote.link.as_deref(), Some("/third/status/999#m"));
        assert!(second.media.is_empty());
    }

    #[test]
    fn test_item_without_status_id() {
        let tweets = TimelineParser::parse(TIMELINE_HTML);
        let third = &tweets[2];
        assert!(third.id.is_none());
        assert_eq!(third.url.as_deref(), Some("/acme/bogus"));
        assert_eq!(third.text, "no id here");
    }

    #[test]
    fn test_empty_page() {
        assert!(TimelineParser::parse("<html><body></body></html>").is_empty());
    }

    #[test]
    fn test_extract_tweet_id() {
        assert_eq!(
            TimelineParser::extract_tweet_id("https://x.com/user/status/123456?s=20"),
            Some("123456".to_string())
        );
        assert_eq!(
            TimelineParser::extract_tweet_id("/user/status/789#m"),
            Some("789".to_string())
        );
        assert_eq!(TimelineParser::extract_tweet_id("https://google.com"), None);
    }
}
