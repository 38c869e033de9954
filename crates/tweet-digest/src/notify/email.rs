//! Email notifications over SMTP.

use std::fmt::Write;

use async_trait::async_trait;
use lettre::message::{header::ContentType, Mailbox};
use lettre::transport::smtp::authentication::Credentials;
use lettre::{AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor};

use crate::error::{DigestError, DigestResult};
use crate::pipeline::ClassifiedTweet;
use crate::storage::timestamp_now;

use super::NotificationSink;

/// Default SMTP host.
pub const DEFAULT_SMTP_HOST: &str = "smtp.gmail.com";

/// Default SMTP port (STARTTLS).
pub const DEFAULT_SMTP_PORT: u16 = 587;

/// Tweet text kept per entry in batch digests.
const BATCH_TEXT_CHARS: usize = 1000;

/// SMTP credentials and addresses.
#[derive(Debug, Clone)]
pub struct EmailSettings {
    pub smtp_host: String,
    pub smtp_port: u16,
    /// SMTP username, also used as the sender address.
    pub username: String,
    pub password: String,
    pub recipient: String,
}

impl EmailSettings {
    /// Read settings from the environment.
    ///
    /// Requires `EMAIL_USER`, `EMAIL_PASSWORD` and `RECIPIENT_EMAIL`; returns `None`
    /// if any is missing. `SMTP_SERVER` and `SMTP_PORT` are optional.
    #[must_use]
    pub fn from_env() -> Option<Self> {
        let var = |name: &str| std::env::var(name).ok().filter(|v| !v.trim().is_empty());

        Some(Self {
            smtp_host: var("SMTP_SERVER").unwrap_or_else(|| DEFAULT_SMTP_HOST.to_string()),
            smtp_port: var("SMTP_PORT")
                .and_then(|p| p.parse().ok())
                .unwrap_or(DEFAULT_SMTP_PORT),
            username: var("EMAIL_USER")?,
            password: var("EMAIL_PASSWORD")?,
            recipient: var("RECIPIENT_EMAIL")?,
        })
    }
}

/// Sends tweet alerts and batch digests by email.
pub struct EmailNotifier {
    settings: Option<EmailSettings>,
    min_score_for_email: u8,
}

impl EmailNotifier {
    /// Create a notifier. `None` settings make every send a no-op.
    #[must_use]
    pub fn new(settings: Option<EmailSettings>, min_score_for_email: u8) -> Self {
        if settings.is_none() {
            tracing::warn!(
                "Email notifications not configured. Set EMAIL_USER, EMAIL_PASSWORD, RECIPIENT_EMAIL"
            );
        }
        Self {
            settings,
            min_score_for_email,
        }
    }

    /// Create from environment variables.
    #[must_use]
    pub fn from_env(min_score_for_email: u8) -> Self {
        Self::new(EmailSettings::from_env(), min_score_for_email)
    }

    /// Send a plain-text email.
    pub async fn send(&self, subject: &str, body: &str) -> DigestResult<bool> {
        let Some(settings) = &self.settings else {
            return Ok(false);
        };

        let from: Mailbox = settings
            .username
            .parse()
            .map_err(|e| DigestError::Email(format!("Invalid sender address: {e}")))?;
        let to: Mailbox = settings
            .recipient
            .parse()
            .map_err(|e| DigestError::Email(format!("Invalid recipient address: {e}")))?;

        let email = Message::builder()
            .from(from)
            .to(to)
            .subject(subject)
            .header(ContentType::TEXT_PLAIN)
            .body(body.to_string())
            .map_err(|e| DigestError::Email(format!("Failed to build email message: {e}")))?;

        let creds = Credentials::new(settings.username.clone(), settings.password.clone());
        let mailer: AsyncSmtpTransport<Tokio1Executor> =
            AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(&settings.smtp_host)
                .map_err(|e| DigestError::Email(format!("Failed to create SMTP transport: {e}")))?
                .port(settings.smtp_port)
                .credentials(creds)
                .build();

        mailer
            .send(email)
            .await
            .map_err(|e| DigestError::Email(format!("Failed to send email via SMTP: {e}")))?;

        tracing::info!(to = %settings.recipient, subject, "Email sent");
        Ok(true)
    }

    /// Send a test email to verify the SMTP settings.
    pub async fn send_test(&self) -> DigestResult<bool> {
        let body = format!(
            "Tweet digest - test email\n\nEmail configuration is working!\nTime: {}\n\n--\nTweet Digest\n",
            timestamp_now()
        );
        self.send("Tweet Digest - Test Email", &body).await
    }
}

#[async_trait]
impl NotificationSink for EmailNotifier {
    fn name(&self) -> &'static str {
        "email"
    }

    fn enabled(&self) -> bool {
        self.settings.is_some()
    }

    async fn send_tweet_alert(&self, tweet: &ClassifiedTweet, handle: &str) -> DigestResult<bool> {
        if !self.enabled() || tweet.score() < self.min_score_for_email {
            return Ok(false);
        }
        let subject = alert_subject(tweet, handle);
        let body = alert_body(tweet, handle, &timestamp_now());
        self.send(&subject, &body).await
    }

    async fn send_batch_digest(
        &self,
        tweets_by_handle: &[(String, Vec<ClassifiedTweet>)],
        total_important: usize,
    ) -> DigestResult<bool> {
        if !self.enabled() || total_important == 0 {
            return Ok(false);
        }
        let subject = format!("Twitter Digest: {total_important} Important Tweets");
        let body = batch_body(tweets_by_handle, total_important, &timestamp_now());
        self.send(&subject, &body).await
    }
}

fn alert_subject(tweet: &ClassifiedTweet, handle: &str) -> String {
    format!(
        "Important Tweet from @{handle} (Score: {}/10)",
        tweet.importance_score
    )
}

fn alert_body(tweet: &ClassifiedTweet, handle: &str, now: &str) -> String {
    let t = &tweet.tweet;
    let mut body = format!(
        "IMPORTANT TWEET ALERT\n\n\
         Handle: @{handle}\n\
         Author: {} ({})\n\
         Importance Score: {}/10\n\
         Reason: {}\n\
         Date: {}\n\
         Time: {now}\n\n\
         Tweet Content:\n{}\n",
        t.author.as_deref().unwrap_or("Unknown"),
        t.username.clone().unwrap_or_else(|| format!("@{handle}")),
        tweet.importance_score,
        tweet.importance_reason,
        t.display_date.as_deref().unwrap_or("Unknown"),
        if t.text.is_empty() { "No text available" } else { t.text.as_str() },
    );

    if let Some(quoted) = &t.quoted_tweet {
        let _ = write!(
            body,
            "\nQuoted Tweet:\nFrom: {} ({})\n\"{}\"\n",
            quoted.author.as_deref().unwrap_or("Unknown"),
            quoted.username.as_deref().unwrap_or("Unknown"),
            quoted.text.as_deref().unwrap_or("No text"),
        );
    }

    if !t.media.is_empty() {
        let mut kinds: Vec<String> = t.media.iter().map(|m| m.media_type.to_string()).collect();
        kinds.sort();
        kinds.dedup();
        let _ = writeln!(body, "\nMedia: {} attachments ({})", t.media.len(), kinds.join(", "));
    }

    if !t.stats.is_empty() {
        let stat = |key: &str| t.stats.get(key).map_or("N/A", String::as_str);
        let _ = write!(
            body,
            "\nEngagement:\n- Likes: {}\n- Retweets: {}\n- Replies: {}\n",
            stat("likes"),
            stat("retweets"),
            stat("replies"),
        );
    }

    let _ = write!(
        body,
        "\n--\nTweet Digest\nPowered by {} classification\n",
        tweet.classifier_provider
    );
    body
}

fn batch_body(
    tweets_by_handle: &[(String, Vec<ClassifiedTweet>)],
    total_important: usize,
    now: &str,
) -> String {
    let rule = "=".repeat(50);
    let mut body = format!(
        "TWITTER DIGEST REPORT\n\nTotal Important Tweets: {total_important}\nTime: {now}\n"
    );

    for (handle, tweets) in tweets_by_handle {
        if tweets.is_empty() {
            continue;
        }

        let _ = write!(
            body,
            "\n{rule}\n@{} ({} important tweets)\n{rule}\n",
            handle.to_uppercase(),
            tweets.len()
        );

        let mut sorted: Vec<&ClassifiedTweet> = tweets.iter().collect();
        sorted.sort_by(|a, b| b.importance_score.cmp(&a.importance_score));

        for (i, tweet) in sorted.iter().enumerate() {
            let t = &tweet.tweet;
            let _ = write!(
                body,
                "\n{}. [{}/10] {}\nAuthor: {}\nDate: {}\nText: {}\n",
                i + 1,
                tweet.importance_score,
                tweet.importance_reason,
                t.author.as_deref().unwrap_or("Unknown"),
                t.best_date().unwrap_or("Unknown date"),
                truncate(&t.text, BATCH_TEXT_CHARS),
            );
            if let Some(url) = &t.url {
                let _ = writeln!(body, "URL: {url}");
            }
        }
    }

    body.push_str("\n--\nTweet Digest - Batch Notification\n");
    body
}

/// Cut `text` to `max` characters, appending "..." when shortened.
fn truncate(text: &str, max: usize) -> String {
    if text.chars().count() > max {
        format!("{}...", text.chars().take(max).collect::<String>())
    } else {
        text.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::{Classification, ImportanceScore, ScoreSource};
    use crate::twitter::{Media, MediaType, QuotedTweet, Tweet};

    fn classified(id: &str, text: &str, score: u8) -> ClassifiedTweet {
        ClassifiedTweet::new(
            Tweet::new(id, text),
            "acme",
            Classification {
                score: ImportanceScore::new(score).unwrap(),
                reason: format!("reason {id}"),
                provider: ScoreSource::Gpt,
                was_fallback: false,
            },
        )
    }

    #[test]
    fn test_alert_subject() {
        let tweet = classified("1", "hello", 9);
        assert_eq!(
            alert_subject(&tweet, "acme"),
            "Important Tweet from @acme (Score: 9/10)"
        );
    }

    #[test]
    fn test_alert_body_sections() {
        let mut tweet = classified("1", "We shipped", 9);
        tweet.tweet.author = Some("Acme Corp".to_string());
        tweet.tweet.quoted_tweet = Some(QuotedTweet {
            author: Some("Other".to_string()),
            text: Some("original".to_string()),
            ..Default::default()
        });
        tweet.tweet.media = vec![
            Media {
                media_type: MediaType::Image,
                src: "a.jpg".to_string(),
                alt: None,
            },
            Media {
                media_type: MediaType::Image,
                src: "b.jpg".to_string(),
                alt: None,
            },
        ];
        tweet.tweet.stats.insert("likes".to_string(), "1200".to_string());

        let body = alert_body(&tweet, "acme", "2024-01-01 10:00:00");
        assert!(body.contains("Author: Acme Corp (@acme)"));
        assert!(body.contains("Importance Score: 9/10"));
        assert!(body.contains("Time: 2024-01-01 10:00:00"));
        assert!(body.contains("From: Other (Unknown)\n\"original\""));
        assert!(body.contains("Media: 2 attachments (image)"));
        assert!(body.contains("- Likes: 1200\n- Retweets: N/A"));
        assert!(body.contains("Powered by gpt classification"));
    }

    #[test]
    fn test_batch_body_groups_and_sorts() {
        let long = "x".repeat(1200);
        let groups = vec![
            (
                "acme".to_string(),
                vec![classified("1", "low", 6), classified("2", &long, 9)],
            ),
            ("empty".to_string(), Vec::new()),
        ];

        let body = batch_body(&groups, 2, "now");
        assert!(body.contains("@ACME (2 important tweets)"));
        assert!(!body.contains("@EMPTY"));
        let first = body.find("1. [9/10] reason 2").unwrap();
        let second = body.find("2. [6/10] reason 1").unwrap();
        assert!(first < second);
        assert!(body.contains(&format!("Text: {}...", "x".repeat(1000))));
        assert!(!body.contains(&"x".repeat(1001)));
    }

    #[tokio::test]
    async fn test_unconfigured_sends_nothing() {
        let notifier = EmailNotifier::new(None, 8);
        assert!(!notifier.enabled());

        let tweet = classified("1", "big news", 10);
        assert!(!notifier.send_tweet_alert(&tweet, "acme").await.unwrap());
        let groups = vec![("acme".to_string(), vec![tweet])];
        assert!(!notifier.send_batch_digest(&groups, 1).await.unwrap());
        assert!(!notifier.send_test().await.unwrap());
    }

    #[tokio::test]
    async fn test_alert_below_threshold_is_skipped() {
        let settings = EmailSettings {
            smtp_host: "127.0.0.1".to_string(),
            smtp_port: 9,
            username: "bot@example.com".to_string(),
            password: "secret".to_string(),
            recipient: "me@example.com".to_string(),
        };
        let notifier = EmailNotifier::new(Some(settings), 8);
        let tweet = classified("1", "meh", 7);
        assert!(!notifier.send_tweet_alert(&tweet, "acme").await.unwrap());
    }

    #[test]
    fn test_truncate() {
        assert_eq!(truncate("short", 10), "short");
        assert_eq!(truncate("abcdef", 3), "abc...");
    }
}
