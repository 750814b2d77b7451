use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::AppResult;

const FALLBACK_REPLY: &str = "I am having some connection fuzziness to my AI brain, but I'm still here for you.";
const LIMITED_REPLY: &str = "I am HeartBot! I don't have an AI brain configured, so my responses are a bit limited right now. Tell me if you want a telugu song!";
const SONG_TAG: &str = "[SONG]";

#[derive(Serialize)]
struct UpstreamRequest {
    prompt: String,
}

#[derive(Deserialize)]
struct UpstreamReply {
    text: String,
}

/// Bot replies, optionally backed by an HTTP text-generation endpoint.
#[derive(Clone)]
pub struct Companion {
    http: reqwest::Client,
    upstream: Option<String>,
}

impl Companion {
    pub fn new(upstream: Option<String>, timeout: Duration) -> AppResult<Self> {
        let http = reqwest::ClientBuilder::new()
            .timeout(timeout)
            .build()?;
        Ok(Self { http, upstream })
    }

    pub fn offline() -> Self {
        Self {
            http: reqwest::Client::new(),
            upstream: None,
        }
    }

    /// Never fails: upstream trouble degrades to a canned reply.
    pub async fn reply(&self, message: &str) -> String {
        let lowered = message.to_lowercase();

        let Some(url) = &self.upstream else {
            return if lowered.contains("song") {
                format!("Here is a wonderful Telugu song for you:\n{}", song_for(&lowered))
            } else {
                LIMITED_REPLY.to_owned()
            };
        };

        match self.ask(url, message).await {
            Ok(text) => finish_reply(&text, &lowered),
            Err(err) => {
                tracing::warn!(error = %err, "companion upstream failed");
                FALLBACK_REPLY.to_owned()
            }
        }
    }

    async fn ask(&self, url: &str, message: &str) -> Result<String, reqwest::Error> {
        let prompt = format!(
            "Act as HeartBot, an emotional support companion on the HeartLink matching site. \
             A user just said: \"{message}\". Respond kindly and conversationally in 1-3 sentences. \
             If they ask for a song, end your reply with the exact string {SONG_TAG}."
        );

        let reply = self.http
            .post(url)
            .json(&UpstreamRequest { prompt })
            .send()
            .await?
            .error_for_status()?
            .json::<UpstreamReply>()
            .await?;
        Ok(reply.text)
    }
}

fn finish_reply(text: &str, lowered_message: &str) -> String {
    if !text.contains(SONG_TAG) && !lowered_message.contains("song") {
        return text.to_owned();
    }
    let text = text.replace(SONG_TAG, "");
    format!("{}\n\nHere is a song exactly for that mood:\n{}", text.trim(), song_for(lowered_message))
}

/// Picks a track by the mood words in an already lowercased message.
pub fn song_for(lowered: &str) -> String {
    let video_id = if lowered.contains("sad") || lowered.contains("lonely") {
        "zOwvX1PqIhs"
    } else if lowered.contains("motivat") {
        "tKTwK2tq9Z4"
    } else if lowered.contains("breakup") {
        "uB_iJttIe5U"
    } else {
        "WbjnA-bH3j4"
    };
    format!("https://www.youtube.com/embed/{video_id}")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn moods_pick_tracks() {
        assert!(song_for("i feel so lonely").ends_with("zOwvX1PqIhs"));
        assert!(song_for("need motivation").ends_with("tKTwK2tq9Z4"));
        assert!(song_for("rough breakup").ends_with("uB_iJttIe5U"));
        assert!(song_for("play anything").ends_with("WbjnA-bH3j4"));
    }

    #[test]
    fn song_tag_is_replaced_with_a_link() {
        let reply = finish_reply("Here you go! [SONG]", "cheer me up");
        assert!(!reply.contains(SONG_TAG));
        assert!(reply.starts_with("Here you go!"));
        assert!(reply.contains("youtube.com/embed/"));

        assert_eq!(finish_reply("Hello there", "hi"), "Hello there");
    }

    #[tokio::test]
    async fn offline_replies_are_canned() {
        let bot = Companion::offline();
        assert_eq!(bot.reply("hello").await, LIMITED_REPLY);
        assert!(bot.reply("a sad SONG please").await.ends_with("zOwvX1PqIhs"));
    }

    #[tokio::test]
    async fn unreachable_upstream_falls_back() {
        let bot = Companion::new(Some("http://127.0.0.1:9/generate".to_owned()), Duration::from_millis(500)).unwrap();
        assert_eq!(bot.reply("hello").await, FALLBACK_REPLY);
    }
}
