use std::collections::BTreeMap;

use async_trait::async_trait;
use serde::Serialize;

use crate::db::models::{CreatePostData, Platform};
use crate::db::PostModel;

/// A post fetched from an external platform, before it becomes one of ours.
#[derive(Debug, Clone)]
pub struct SocialPost {
    pub platform: Platform,
    pub content: String,
    pub image_url: Option<String>,
    pub external_url: Option<String>,
    pub tags: Vec<String>,
}

/// Something that can be asked for recent posts carrying any of a set of hashtags.
#[async_trait]
pub trait SocialSource: Send + Sync {
    async fn recent_posts(&self, hashtags: &[String]) -> anyhow::Result<Vec<SocialPost>>;
}

/// Source used when no platform integration is configured.
pub struct EmptySource;

#[async_trait]
impl SocialSource for EmptySource {
    async fn recent_posts(&self, hashtags: &[String]) -> anyhow::Result<Vec<SocialPost>> {
        tracing::debug!(hashtags = ?hashtags, "No social source configured");
        Ok(Vec::new())
    }
}

#[derive(Debug, Clone, Default, Serialize, PartialEq, Eq)]
pub struct AggregationReport {
    pub total: usize,
    pub per_campaign: BTreeMap<String, usize>,
}

fn to_post_data(post: SocialPost, campaign: &str) -> CreatePostData {
    CreatePostData {
        user_id: None,
        title: Some(format!("{} post for {}", post.platform, campaign)),
        content: post.content,
        image_url: post.image_url,
        platform: Some(post.platform),
        external_post_url: post.external_url,
        tags: Some(post.tags),
        is_featured: Some(false),
        is_public: Some(true),
    }
}

/// Pull recent posts for every campaign and store them as anonymous public posts.
///
/// A campaign whose fetch fails counts zero; a post that fails to store is skipped.
pub async fn aggregate(
    posts: &PostModel,
    source: &dyn SocialSource,
    campaigns: &BTreeMap<String, Vec<String>>,
) -> AggregationReport {
    let mut report = AggregationReport::default();

    for (campaign, hashtags) in campaigns {
        tracing::info!(campaign = %campaign, hashtags = ?hashtags, "Aggregating social posts");

        let fetched = match source.recent_posts(hashtags).await {
            Ok(fetched) => fetched,
            Err(e) => {
                tracing::warn!(campaign = %campaign, "Failed to fetch social posts: {}", e);
                Vec::new()
            }
        };

        let mut stored = 0;
        for post in fetched {
            let platform = post.platform;
            match posts.create_post(to_post_data(post, campaign)) {
                Ok(_) => stored += 1,
                Err(e) => {
                    tracing::warn!(campaign = %campaign, %platform, "Skipping social post: {}", e)
                }
            }
        }

        tracing::info!(campaign = %campaign, stored, "Campaign aggregated");
        report.per_campaign.insert(campaign.clone(), stored);
        report.total += stored;
    }

    report
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::test_support;

    struct FixedSource;

    #[async_trait]
    impl SocialSource for FixedSource {
        async fn recent_posts(&self, hashtags: &[String]) -> anyhow::Result<Vec<SocialPost>> {
            if hashtags.iter().any(|t| t == "#broken") {
                anyhow::bail!("platform unavailable");
            }
            Ok(vec![
                SocialPost {
                    platform: Platform::Instagram,
                    content: format!("Loving {}", hashtags.join(" ")),
                    image_url: Some("https://cdn.example.com/a.jpg".into()),
                    external_url: Some("https://instagram.com/p/abc".into()),
                    tags: hashtags.to_vec(),
                },
                SocialPost {
                    platform: Platform::Twitter,
                    content: String::new(),
                    image_url: None,
                    external_url: None,
                    tags: vec![],
                },
            ])
        }
    }

    fn campaigns(entries: &[(&str, &[&str])]) -> BTreeMap<String, Vec<String>> {
        entries
            .iter()
            .map(|(k, tags)| (k.to_string(), tags.iter().map(|t| t.to_string()).collect()))
            .collect()
    }

    #[tokio::test]
    async fn stores_valid_posts_and_skips_invalid_ones() {
        let (_tmp, pool) = test_support::pool();
        let posts = PostModel::new(pool);

        let report = aggregate(
            &posts,
            &FixedSource,
            &campaigns(&[("jazz_festival_2025", &["#jazzfest2025"])]),
        )
        .await;

        // The twitter post has empty content and is rejected by validation.
        assert_eq!(report.total, 1);
        assert_eq!(report.per_campaign["jazz_festival_2025"], 1);

        let stored = posts.get_all_posts(50, 0).unwrap();
        assert_eq!(stored.len(), 1);
        let post = &stored[0];
        assert_eq!(post.title.as_deref(), Some("instagram post for jazz_festival_2025"));
        assert_eq!(post.platform, Platform::Instagram);
        assert_eq!(post.user_id, None);
        assert!(post.is_public);
        assert!(!post.is_featured);
        assert_eq!(post.tags.as_deref(), Some(&["#jazzfest2025".to_string()][..]));
    }

    #[tokio::test]
    async fn failing_campaign_does_not_stop_the_rest() {
        let (_tmp, pool) = test_support::pool();
        let posts = PostModel::new(pool);

        let report = aggregate(
            &posts,
            &FixedSource,
            &campaigns(&[("a_broken", &["#broken"]), ("rock_2025", &["#liverock"])]),
        )
        .await;

        assert_eq!(report.per_campaign["a_broken"], 0);
        assert_eq!(report.per_campaign["rock_2025"], 1);
        assert_eq!(report.total, 1);
    }

    #[tokio::test]
    async fn empty_source_stores_nothing() {
        let (_tmp, pool) = test_support::pool();
        let posts = PostModel::new(pool);

        let report = aggregate(&posts, &EmptySource, &campaigns(&[("pop", &["#livepop"])])).await;
        assert_eq!(report.total, 0);
        assert_eq!(report.per_campaign["pop"], 0);
        assert_eq!(posts.get_post_count().unwrap(), 0);
    }
}
