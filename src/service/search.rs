use anyhow::Result;

use super::context::CommandContext;
use crate::cli::ScopeArgs;
use crate::ui::Output;
use memo_types::{MemoryCategory, SearchOptions};

pub struct SearchArgs {
    pub query: String,
    pub limit: Option<usize>,
    pub threshold: Option<f32>,
    pub categories: Option<Vec<String>>,
    pub tags: Option<Vec<String>>,
    pub topic: Option<String>,
    pub user: Option<String>,
}

pub async fn search(args: SearchArgs, scope: ScopeArgs) -> Result<()> {
    let output = Output::new();
    let ctx = CommandContext::load(scope)?;

    let options = build_options(&args, ctx.config.search_limit, ctx.config.similarity_threshold)?;

    let service = ctx.memory_service()?;
    output.store_info(&ctx.config.store.url, ctx.organization_id(), None);

    output.status("Encoding", "query");
    output.status("Searching", "memories");
    let results = service
        .search(&args.query, ctx.organization_id(), &options)
        .await?;

    if results.is_empty() {
        output.info(&format!(
            "No results found above threshold {:.2}",
            options.threshold
        ));
    } else {
        output.search_results(&results);
    }

    Ok(())
}

/// 在配置默认值之上叠加命令行过滤条件
fn build_options(
    args: &SearchArgs,
    default_limit: usize,
    default_threshold: f32,
) -> Result<SearchOptions> {
    let categories = match &args.categories {
        Some(names) => Some(
            names
                .iter()
                .map(|n| n.parse::<MemoryCategory>())
                .collect::<memo_types::Result<Vec<_>>>()?,
        ),
        None => None,
    };

    let options = SearchOptions {
        limit: args.limit.unwrap_or(default_limit),
        threshold: args.threshold.unwrap_or(default_threshold),
        categories,
        tags: args.tags.clone(),
        topic_id: args.topic.clone(),
        user_id: args.user.clone(),
    };
    options.validate()?;
    Ok(options)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args() -> SearchArgs {
        SearchArgs {
            query: "q".to_string(),
            limit: None,
            threshold: None,
            categories: None,
            tags: None,
            topic: None,
            user: None,
        }
    }

    #[test]
    fn test_defaults_come_from_config() {
        let options = build_options(&args(), 15, 0.4).unwrap();
        assert_eq!(options.limit, 15);
        assert_eq!(options.threshold, 0.4);
        assert!(options.categories.is_none());
    }

    #[test]
    fn test_flags_override_and_parse_categories() {
        let mut a = args();
        a.limit = Some(3);
        a.categories = Some(vec!["knowledge".to_string(), "Project".to_string()]);

        let options = build_options(&a, 10, 0.7).unwrap();
        assert_eq!(options.limit, 3);
        assert_eq!(
            options.categories,
            Some(vec![MemoryCategory::Knowledge, MemoryCategory::Project])
        );
    }

    #[test]
    fn test_rejects_bad_values() {
        let mut a = args();
        a.threshold = Some(2.0);
        assert!(build_options(&a, 10, 0.7).is_err());

        let mut a = args();
        a.categories = Some(vec!["misc".to_string()]);
        assert!(build_options(&a, 10, 0.7).is_err());
    }
}
