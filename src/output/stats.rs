//! Statistics generation from the harvest database
//!
//! This module provides functionality for extracting and displaying
//! harvest statistics from the storage layer.

use crate::sites::Site;
use crate::storage::{PostStore, RunRecord, StorageResult};

/// Harvest statistics summary
#[derive(Debug, Clone)]
pub struct HarvestStatistics {
    /// Total number of stored posts
    pub total_posts: u64,

    /// Total number of stored comments
    pub total_comments: u64,

    /// Post counts per site, sites without posts omitted
    pub posts_by_site: Vec<(Site, u64)>,

    /// Most recent run, if any
    pub latest_run: Option<RunRecord>,
}

impl HarvestStatistics {
    /// Average comments per stored post
    pub fn comments_per_post(&self) -> f64 {
        if self.total_posts == 0 {
            return 0.0;
        }
        self.total_comments as f64 / self.total_posts as f64
    }
}

/// Loads statistics from storage
///
/// # Arguments
///
/// * `store` - The store to query
///
/// # Returns
///
/// * `Ok(HarvestStatistics)` - Successfully loaded statistics
/// * `Err(StorageError)` - Failed to query statistics
pub fn load_statistics(store: &dyn PostStore) -> StorageResult<HarvestStatistics> {
    Ok(HarvestStatistics {
        total_posts: store.count_posts(None)?,
        total_comments: store.count_comments()?,
        posts_by_site: store.posts_by_site()?,
        latest_run: store.get_latest_run()?,
    })
}

/// Prints statistics to stdout in a formatted manner
///
/// # Arguments
///
/// * `stats` - The statistics to display
pub fn print_statistics(stats: &HarvestStatistics) {
    println!("=== Harvest Statistics ===\n");

    println!("Overview:");
    println!("  Posts stored: {}", stats.total_posts);
    println!("  Comments stored: {}", stats.total_comments);
    println!("  Comments per post: {:.1}", stats.comments_per_post());
    println!();

    if !stats.posts_by_site.is_empty() {
        println!("Posts by Site:");
        let mut site_counts = stats.posts_by_site.clone();
        site_counts.sort_by(|a, b| b.1.cmp(&a.1));

        for (site, count) in site_counts {
            let percentage = (count as f64 / stats.total_posts.max(1) as f64) * 100.0;
            println!("  {}: {} ({:.1}%)", site, count, percentage);
        }
        println!();
    }

    match &stats.latest_run {
        Some(run) => {
            println!("Latest Run (#{}):", run.id);
            println!("  Started: {}", run.started_at);
            if let Some(finished) = &run.finished_at {
                println!("  Finished: {}", finished);
            }
            println!("  Status: {}", run.status.to_db_string());
            println!("  Succeeded: {}, failed: {}", run.successes, run.failures);
        }
        None => println!("No runs recorded yet."),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::SqliteStore;

    #[test]
    fn test_statistics_on_empty_store() {
        let store = SqliteStore::new_in_memory().unwrap();
        let stats = load_statistics(&store).unwrap();

        assert_eq!(stats.total_posts, 0);
        assert!(stats.posts_by_site.is_empty());
        assert!(stats.latest_run.is_none());
        assert_eq!(stats.comments_per_post(), 0.0);
    }

    #[test]
    fn test_comments_per_post() {
        let stats = HarvestStatistics {
            total_posts: 4,
            total_comments: 10,
            posts_by_site: vec![(Site::Clien, 4)],
            latest_run: None,
        };
        assert!((stats.comments_per_post() - 2.5).abs() < 0.01);
    }
}
