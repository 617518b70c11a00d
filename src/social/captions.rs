//! Caption generation for deal posts
//!
//! Builds platform-specific marketing copy for a deal. The primary path is
//! one Gemini `generateContent` call whose response must contain a JSON
//! object with exactly the four platform keys; any failure — no API key,
//! HTTP error, unparseable output, missing key — falls back entirely to a
//! deterministic template path. `generate` always resolves: there is no
//! error case the orchestrator has to handle.

use metrics::counter;
use serde::Deserialize;
use serde_json::json;
use thiserror::Error;
use tracing::{debug, warn};

use crate::social::types::{
    DealForSocialPost, PlatformCaptions, TWEET_CHAR_LIMIT, truncate_with_ellipsis,
};

const GEMINI_MODEL: &str = "gemini-1.5-flash";

/// Errors internal to the AI path; all of them resolve to the template path.
#[derive(Debug, Error)]
enum CaptionError {
    #[error("network error: {0}")]
    Network(#[from] reqwest::Error),
    #[error("HTTP {status} from caption model")]
    Api { status: u16 },
    #[error("empty model response")]
    EmptyResponse,
    #[error("no JSON object in model response")]
    NoJsonObject,
    #[error("malformed caption JSON: {0}")]
    MalformedJson(String),
    #[error("missing or empty '{0}' caption")]
    MissingCaption(&'static str),
}

#[derive(Debug, Deserialize)]
struct GenerateContentResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    content: CandidateContent,
}

#[derive(Debug, Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<ContentPart>,
}

#[derive(Debug, Deserialize)]
struct ContentPart {
    #[serde(default)]
    text: String,
}

#[derive(Debug, Deserialize)]
struct RawCaptions {
    facebook: Option<String>,
    instagram: Option<String>,
    twitter: Option<String>,
    tiktok: Option<String>,
}

/// Generates platform captions for deals, AI-first with template fallback.
pub struct CaptionGenerator {
    client: reqwest::Client,
    api_key: Option<String>,
    api_base: String,
}

impl CaptionGenerator {
    pub fn new(client: reqwest::Client, api_key: Option<String>, api_base: String) -> Self {
        Self {
            client,
            api_key,
            api_base,
        }
    }

    /// Produce captions for all four platforms. Never fails: any problem on
    /// the AI path resolves to the deterministic template output.
    pub async fn generate(&self, deal: &DealForSocialPost) -> PlatformCaptions {
        let Some(api_key) = self.api_key.as_deref() else {
            debug!(deal_id = %deal.id, "No caption model API key configured, using templates");
            return template_captions(deal);
        };

        match self.generate_with_model(api_key, deal).await {
            Ok(captions) => captions,
            Err(err) => {
                warn!(
                    deal_id = %deal.id,
                    error = %err,
                    "Caption generation failed, falling back to templates"
                );
                counter!("caption_generation_fallback_total").increment(1);
                template_captions(deal)
            }
        }
    }

    async fn generate_with_model(
        &self,
        api_key: &str,
        deal: &DealForSocialPost,
    ) -> Result<PlatformCaptions, CaptionError> {
        let prompt = build_prompt(deal);
        let body = json!({
            "contents": [{ "parts": [{ "text": prompt }] }]
        });

        let response = self
            .client
            .post(format!(
                "{}/v1beta/models/{}:generateContent",
                self.api_base, GEMINI_MODEL
            ))
            .query(&[("key", api_key)])
            .json(&body)
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(CaptionError::Api {
                status: response.status().as_u16(),
            });
        }

        let payload: GenerateContentResponse = response
            .json()
            .await
            .map_err(|e| CaptionError::MalformedJson(e.to_string()))?;

        let text = payload
            .candidates
            .first()
            .map(|c| {
                c.content
                    .parts
                    .iter()
                    .map(|p| p.text.as_str())
                    .collect::<String>()
            })
            .filter(|t| !t.trim().is_empty())
            .ok_or(CaptionError::EmptyResponse)?;

        parse_captions(&text)
    }
}

/// Build the single prompt shared by the whole batch. Pricing, location, and
/// deal-type urgency framing are embedded so the model sees everything in
/// one shot.
fn build_prompt(deal: &DealForSocialPost) -> String {
    let urgency = if deal.deal_type.is_flash() {
        "This is a limited-time flash deal; the copy should create urgency to claim it today."
    } else {
        "This is a standing deal; the copy should be inviting without artificial urgency."
    };
    let description = deal.description.as_deref().unwrap_or("");

    format!(
        "You are writing social media captions for a local deals marketplace.\n\
         Deal: {title}\n\
         Business: {business} ({category}) in {city}, {state}\n\
         Price: ${deal_price:.2} (was ${original_price:.2}, {discount}% off)\n\
         Details: {description}\n\
         {urgency}\n\n\
         Respond with a JSON object containing exactly these four string keys:\n\
         \"facebook\": an engaging caption with emojis, 2-3 sentences.\n\
         \"instagram\": a caption with emojis and 3-5 hashtags that tells people to \
         use the link in bio to claim the deal. Do not include any URL.\n\
         \"twitter\": a punchy caption under 240 characters.\n\
         \"tiktok\": a short, high-energy caption with hashtags.\n\
         Do not include any URLs in any caption. Return only the JSON object.",
        title = deal.title,
        business = deal.vendor.business_name,
        category = deal.vendor.category,
        city = deal.vendor.city,
        state = deal.vendor.state,
        deal_price = deal.deal_price,
        original_price = deal.original_price,
        discount = deal.discount_percentage,
    )
}

/// Locate the first JSON-object-shaped substring in the model's raw text.
/// Models routinely wrap JSON in prose or code fences.
fn extract_json_object(text: &str) -> Option<&str> {
    let start = text.find('{')?;
    let end = text.rfind('}')?;
    (end > start).then(|| &text[start..=end])
}

/// Parse and validate the model output. All four keys must be present and
/// non-empty; anything less means full template fallback, never a partial
/// merge.
fn parse_captions(raw_text: &str) -> Result<PlatformCaptions, CaptionError> {
    let json_text = extract_json_object(raw_text).ok_or(CaptionError::NoJsonObject)?;
    let raw: RawCaptions = serde_json::from_str(json_text)
        .map_err(|e| CaptionError::MalformedJson(e.to_string()))?;

    let require = |value: Option<String>, key: &'static str| {
        value
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty())
            .ok_or(CaptionError::MissingCaption(key))
    };

    let facebook = require(raw.facebook, "facebook")?;
    let instagram = require(raw.instagram, "instagram")?;
    let twitter = require(raw.twitter, "twitter")?;
    let tiktok = require(raw.tiktok, "tiktok")?;

    // Model output occasionally blows the tweet budget; trim here so the
    // adapter-level cap only has to handle the appended claim link.
    let twitter = truncate_with_ellipsis(&twitter, TWEET_CHAR_LIMIT);

    Ok(PlatformCaptions {
        facebook,
        instagram,
        twitter,
        tiktok,
    })
}

/// Deterministic template captions: pure string interpolation, no network,
/// always succeeds. Used whenever the AI path is unavailable or invalid.
pub(crate) fn template_captions(deal: &DealForSocialPost) -> PlatformCaptions {
    let business = &deal.vendor.business_name;
    let city = &deal.vendor.city;
    let urgency = if deal.deal_type.is_flash() {
        "⚡ Flash deal — today only! "
    } else {
        ""
    };
    let city_tag: String = city
        .chars()
        .filter(|c| c.is_alphanumeric())
        .collect::<String>()
        .to_lowercase();

    let facebook = format!(
        "🔥 {discount}% OFF at {business}! {title} — now ${deal_price:.2} (was ${original_price:.2}). {urgency}Don't miss out!",
        discount = deal.discount_percentage,
        title = deal.title,
        deal_price = deal.deal_price,
        original_price = deal.original_price,
    );
    let instagram = format!(
        "🔥 {discount}% OFF {title} at {business} in {city}! Now ${deal_price:.2} (was ${original_price:.2}). {urgency}Tap the link in our bio to claim this deal! #localdeals #{city_tag} #supportlocal",
        discount = deal.discount_percentage,
        title = deal.title,
        deal_price = deal.deal_price,
        original_price = deal.original_price,
    );
    let twitter = format!(
        "{urgency}{discount}% OFF: {title} at {business}, {city} — now ${deal_price:.2}!",
        discount = deal.discount_percentage,
        title = deal.title,
        deal_price = deal.deal_price,
    );
    let tiktok = format!(
        "{discount}% OFF {title} 🔥 {business} · {city} {urgency}#localdeals #{city_tag}",
        discount = deal.discount_percentage,
        title = deal.title,
    );

    PlatformCaptions {
        facebook,
        instagram,
        twitter: truncate_with_ellipsis(&twitter, TWEET_CHAR_LIMIT),
        tiktok,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::social::types::{DealType, VendorSnapshot};
    use uuid::Uuid;

    fn sample_deal() -> DealForSocialPost {
        DealForSocialPost {
            id: Uuid::new_v4(),
            title: "Large 2-topping pizza".to_string(),
            description: Some("Any two toppings, dine-in or takeout".to_string()),
            deal_type: DealType::SpontiCoupon,
            original_price: 40.0,
            deal_price: 20.0,
            discount_percentage: 50,
            image_url: Some("https://cdn.example.com/pizza.jpg".to_string()),
            vendor_id: Uuid::new_v4(),
            vendor: VendorSnapshot {
                business_name: "Joe's Pizza".to_string(),
                city: "Miami".to_string(),
                state: "FL".to_string(),
                category: "Restaurants".to_string(),
                subscription_tier: "premium".to_string(),
            },
        }
    }

    #[test]
    fn test_template_captions_are_deterministic() {
        let deal = sample_deal();
        assert_eq!(template_captions(&deal), template_captions(&deal));
    }

    #[test]
    fn test_template_captions_embed_deal_facts() {
        let captions = template_captions(&sample_deal());
        assert!(captions.facebook.contains("50% OFF"));
        assert!(captions.facebook.contains("Joe's Pizza"));
        assert!(captions.instagram.contains("link in our bio"));
        assert!(captions.twitter.contains("Miami"));
        assert!(captions.tiktok.contains("#localdeals"));
    }

    #[test]
    fn test_template_flash_deal_gets_urgency_clause() {
        let mut deal = sample_deal();
        let flash = template_captions(&deal);
        deal.deal_type = DealType::Regular;
        let regular = template_captions(&deal);

        assert!(flash.facebook.contains("today only"));
        assert!(!regular.facebook.contains("today only"));
    }

    #[test]
    fn test_template_captions_contain_no_urls() {
        let captions = template_captions(&sample_deal());
        for caption in [
            &captions.facebook,
            &captions.instagram,
            &captions.twitter,
            &captions.tiktok,
        ] {
            assert!(!caption.contains("http"));
        }
    }

    #[test]
    fn test_extract_json_object_from_fenced_output() {
        let text = "Here you go!\n```json\n{\"a\": 1}\n```\nEnjoy.";
        assert_eq!(extract_json_object(text), Some("{\"a\": 1}"));
        assert_eq!(extract_json_object("no json here"), None);
    }

    #[test]
    fn test_parse_captions_accepts_complete_object() {
        let raw = r#"Sure! {"facebook": "fb", "instagram": "ig", "twitter": "tw", "tiktok": "tt"}"#;
        let captions = parse_captions(raw).expect("parses");
        assert_eq!(captions.facebook, "fb");
        assert_eq!(captions.tiktok, "tt");
    }

    #[test]
    fn test_parse_captions_rejects_missing_key() {
        let raw = r#"{"facebook": "fb", "instagram": "ig", "twitter": "tw"}"#;
        assert!(matches!(
            parse_captions(raw),
            Err(CaptionError::MissingCaption("tiktok"))
        ));
    }

    #[test]
    fn test_parse_captions_rejects_empty_value() {
        let raw = r#"{"facebook": "fb", "instagram": "  ", "twitter": "tw", "tiktok": "tt"}"#;
        assert!(matches!(
            parse_captions(raw),
            Err(CaptionError::MissingCaption("instagram"))
        ));
    }

    #[test]
    fn test_parse_captions_caps_twitter_length() {
        let long = "x".repeat(400);
        let raw = format!(
            r#"{{"facebook": "fb", "instagram": "ig", "twitter": "{long}", "tiktok": "tt"}}"#
        );
        let captions = parse_captions(&raw).expect("parses");
        assert_eq!(captions.twitter.chars().count(), TWEET_CHAR_LIMIT);
        assert!(captions.twitter.ends_with('…'));
    }

    #[tokio::test]
    async fn test_generate_without_api_key_uses_templates() {
        let generator = CaptionGenerator::new(
            reqwest::Client::new(),
            None,
            "http://127.0.0.1:1".to_string(),
        );
        let deal = sample_deal();

        let captions = generator.generate(&deal).await;
        assert_eq!(captions, template_captions(&deal));
    }

    fn gemini_response(text: &str) -> serde_json::Value {
        serde_json::json!({
            "candidates": [{ "content": { "parts": [{ "text": text }] } }]
        })
    }

    #[tokio::test]
    async fn test_generate_uses_model_captions_when_valid() {
        let server = wiremock::MockServer::start().await;
        wiremock::Mock::given(wiremock::matchers::method("POST"))
            .and(wiremock::matchers::path(
                "/v1beta/models/gemini-1.5-flash:generateContent",
            ))
            .respond_with(wiremock::ResponseTemplate::new(200).set_body_json(gemini_response(
                r#"```json
{"facebook": "ai fb", "instagram": "ai ig", "twitter": "ai tw", "tiktok": "ai tt"}
```"#,
            )))
            .expect(1)
            .mount(&server)
            .await;

        let generator = CaptionGenerator::new(
            reqwest::Client::new(),
            Some("test-key".to_string()),
            server.uri(),
        );
        let captions = generator.generate(&sample_deal()).await;

        assert_eq!(captions.facebook, "ai fb");
        assert_eq!(captions.tiktok, "ai tt");
    }

    #[tokio::test]
    async fn test_generate_missing_key_falls_back_to_full_template_output() {
        let server = wiremock::MockServer::start().await;
        wiremock::Mock::given(wiremock::matchers::method("POST"))
            .respond_with(wiremock::ResponseTemplate::new(200).set_body_json(gemini_response(
                r#"{"facebook": "ai fb", "instagram": "ai ig", "twitter": "ai tw"}"#,
            )))
            .expect(1)
            .mount(&server)
            .await;

        let generator = CaptionGenerator::new(
            reqwest::Client::new(),
            Some("test-key".to_string()),
            server.uri(),
        );
        let deal = sample_deal();
        let captions = generator.generate(&deal).await;

        // Full fallback, no partial mixing of AI and template captions.
        assert_eq!(captions, template_captions(&deal));
    }

    #[tokio::test]
    async fn test_generate_model_error_falls_back_to_templates() {
        let server = wiremock::MockServer::start().await;
        wiremock::Mock::given(wiremock::matchers::method("POST"))
            .respond_with(wiremock::ResponseTemplate::new(500))
            .expect(1)
            .mount(&server)
            .await;

        let generator = CaptionGenerator::new(
            reqwest::Client::new(),
            Some("test-key".to_string()),
            server.uri(),
        );
        let deal = sample_deal();

        assert_eq!(generator.generate(&deal).await, template_captions(&deal));
    }
}
