pub mod args;
pub mod get;
pub mod groups;
pub mod query;
pub mod streams;
pub mod watch;

use crate::config::{Config, ConfigError};
use crate::output::LineSender;
use crate::remote::{PagedClient, RemoteError, StreamsRequest};
use crate::resolve::{
    compile_pattern, expand_pattern, resolve_fuzzy, select_streams, ResolveError,
    MAX_FILTER_STREAMS,
};
use crate::tail::TailError;
use crate::window::TimeParseError;
use args::{Commands, GroupTarget, StreamScope};
use chrono::{DateTime, Utc};
use futures::stream::{FuturesUnordered, StreamExt};
use std::future::Future;
use thiserror::Error;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

pub use args::Cli;

/// Process exit codes
pub mod exit_code {
    pub const REMOTE: u8 = 1;
    pub const USAGE: u8 = 2;
    pub const NO_STREAMS: u8 = 3;
    pub const NO_GROUP_MATCH: u8 = 4;
    pub const INTERRUPTED: u8 = 130;
}

#[derive(Debug, Error)]
pub enum CommandError {
    #[error("config error: {0}")]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Time(#[from] TimeParseError),

    #[error(transparent)]
    Remote(#[from] RemoteError),

    #[error(transparent)]
    Tail(#[from] TailError),

    #[error(transparent)]
    Resolve(#[from] ResolveError),

    #[error("no streams found in {group} with prefix {prefix}")]
    NoStreamsForPrefix { group: String, prefix: String },

    #[error("{0}")]
    InvalidArgument(String),

    #[error("{} of {total} log groups failed: {}", .failed.len(), .failed.join(", "))]
    GroupsFailed { failed: Vec<String>, total: usize },

    #[error("output closed")]
    OutputClosed,

    #[error("failed to write output: {0}")]
    Output(#[from] std::io::Error),

    #[error("task join error: {0}")]
    Join(#[from] tokio::task::JoinError),

    #[error("interrupted")]
    Interrupted,
}

impl CommandError {
    pub fn exit_code(&self) -> u8 {
        match self {
            CommandError::Config(_)
            | CommandError::Time(_)
            | CommandError::InvalidArgument(_)
            | CommandError::Resolve(ResolveError::InvalidPattern(_)) => exit_code::USAGE,
            CommandError::Resolve(_) => exit_code::NO_GROUP_MATCH,
            CommandError::NoStreamsForPrefix { .. } => exit_code::NO_STREAMS,
            CommandError::Interrupted => exit_code::INTERRUPTED,
            CommandError::Remote(_)
            | CommandError::Tail(_)
            | CommandError::GroupsFailed { .. }
            | CommandError::OutputClosed
            | CommandError::Output(_)
            | CommandError::Join(_) => exit_code::REMOTE,
        }
    }

    /// Follow-up command to suggest after the error message
    pub fn hint(&self) -> Option<String> {
        match self {
            CommandError::NoStreamsForPrefix { group, .. } => {
                Some(format!("To view available streams: `saw streams {}`", group))
            }
            CommandError::Resolve(ResolveError::NoGroups)
            | CommandError::Resolve(ResolveError::NoPatternMatches { .. }) => {
                Some("To view available groups: `saw groups`".to_string())
            }
            _ => None,
        }
    }
}

/// Everything a command needs, shared by every group it runs against.
///
/// `now` is captured once per invocation so every relative time in the
/// command resolves against the same instant.
#[derive(Debug, Clone)]
pub struct Context {
    pub client: PagedClient,
    pub config: Config,
    pub now: DateTime<Utc>,
    pub output: LineSender,
    pub cancel: CancellationToken,
}

impl Context {
    pub async fn emit(&self, line: String) -> Result<(), CommandError> {
        self.output
            .send(line)
            .await
            .map_err(|_| CommandError::OutputClosed)
    }

    /// Run `fut` unless the invocation is interrupted first
    pub async fn interruptible<T, F>(&self, fut: F) -> Result<T, CommandError>
    where
        F: Future<Output = Result<T, CommandError>>,
    {
        tokio::select! {
            _ = self.cancel.cancelled() => Err(CommandError::Interrupted),
            result = fut => result,
        }
    }
}

pub async fn dispatch(ctx: &Context, command: Commands) -> Result<(), CommandError> {
    match command {
        Commands::Groups(args) => groups::run(ctx, &args).await,
        Commands::Streams(args) => streams::run(ctx, &args).await,
        Commands::Get(args) => get::run(ctx, &args).await,
        Commands::Watch(args) => watch::run(ctx, &args).await,
        Commands::Query(args) => query::run(ctx, &args).await,
        Commands::Version => ctx.emit(version_string()).await,
    }
}

pub fn version_string() -> String {
    format!("v{}", env!("CARGO_PKG_VERSION"))
}

/// Turn the positional group argument into concrete group names.
///
/// A regex is compiled before anything is listed, so a bad pattern never
/// costs a remote call.
pub async fn resolve_targets(ctx: &Context, target: &GroupTarget) -> Result<Vec<String>, CommandError> {
    if target.regex {
        let pattern = compile_pattern(&target.group)?;
        let groups = ctx.client.list_groups(None).await?;
        let names = expand_pattern(&pattern, &groups)?;
        debug!(pattern = %target.group, matched = names.len(), "Expanded group pattern");
        return Ok(names);
    }

    if target.fuzzy {
        let groups = ctx.client.list_groups(None).await?;
        let name = resolve_fuzzy(&target.group, &groups)?;
        debug!(pattern = %target.group, group = %name, "Resolved fuzzy group");
        return Ok(vec![name]);
    }

    Ok(vec![target.group.clone()])
}

/// Stream names to restrict a group's window to, or `None` for every stream
pub async fn resolve_scope(
    ctx: &Context,
    group: &str,
    scope: &StreamScope,
) -> Result<Option<Vec<String>>, CommandError> {
    if let Some(prefix) = &scope.prefix {
        let request = StreamsRequest {
            prefix: Some(prefix.clone()),
            ..StreamsRequest::new(group)
        };
        let streams = ctx.client.list_streams(&request).await?;
        if streams.is_empty() {
            return Err(CommandError::NoStreamsForPrefix {
                group: group.to_string(),
                prefix: prefix.clone(),
            });
        }

        let selection = select_streams(&streams, MAX_FILTER_STREAMS);
        if selection.dropped > 0 {
            warn!(
                group,
                prefix = %prefix,
                kept = selection.names.len(),
                dropped = selection.dropped,
                "Too many streams for prefix, keeping the most recently active"
            );
        }
        return Ok(Some(selection.names));
    }

    if !scope.streams.is_empty() {
        if scope.streams.len() > MAX_FILTER_STREAMS {
            return Err(CommandError::InvalidArgument(format!(
                "at most {} streams can be given with --streams, got {}",
                MAX_FILTER_STREAMS,
                scope.streams.len()
            )));
        }
        return Ok(Some(scope.streams.clone()));
    }

    Ok(None)
}

/// Run `op` once per group.
///
/// A single group runs inline and keeps its own error. Several groups run as
/// independent tasks; a failing group is reported as soon as it ends and the
/// rest keep going.
pub async fn for_each_group<F, Fut>(groups: Vec<String>, op: F) -> Result<(), CommandError>
where
    F: Fn(String) -> Fut,
    Fut: Future<Output = Result<(), CommandError>> + Send + 'static,
{
    run_groups(groups, op, report_group_failure).await
}

fn report_group_failure(group: &str, err: &CommandError) {
    eprintln!("Error: {}: {}", group, err);
    if let Some(hint) = err.hint() {
        eprintln!("{}", hint);
    }
}

async fn run_groups<F, Fut, R>(groups: Vec<String>, op: F, mut report: R) -> Result<(), CommandError>
where
    F: Fn(String) -> Fut,
    Fut: Future<Output = Result<(), CommandError>> + Send + 'static,
    R: FnMut(&str, &CommandError),
{
    if groups.len() == 1 {
        if let Some(group) = groups.into_iter().next() {
            return op(group).await;
        }
        return Ok(());
    }

    let total = groups.len();
    let mut tasks: FuturesUnordered<_> = groups
        .into_iter()
        .map(|group| {
            let task = tokio::spawn(op(group.clone()));
            async move { (group, task.await) }
        })
        .collect();

    let mut failed = Vec::new();
    let mut interrupted = false;
    while let Some((group, result)) = tasks.next().await {
        match result.map_err(CommandError::from).and_then(|r| r) {
            Ok(()) => debug!(group = %group, "Log group finished"),
            Err(CommandError::Interrupted) => interrupted = true,
            Err(e) => {
                report(&group, &e);
                failed.push(group);
            }
        }
    }

    if !failed.is_empty() {
        Err(CommandError::GroupsFailed { failed, total })
    } else if interrupted {
        Err(CommandError::Interrupted)
    } else {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::output::create_channel;
    use crate::remote::MemoryLogService;
    use std::sync::Arc;

    fn context(service: &MemoryLogService) -> (Context, crate::output::LineReceiver) {
        let (tx, rx) = create_channel();
        let ctx = Context {
            client: PagedClient::new(Arc::new(service.clone())),
            config: Config::default(),
            now: Utc::now(),
            output: tx,
            cancel: CancellationToken::new(),
        };
        (ctx, rx)
    }

    fn target(group: &str, fuzzy: bool, regex: bool) -> GroupTarget {
        GroupTarget {
            group: group.to_string(),
            fuzzy,
            regex,
        }
    }

    #[test]
    fn test_exit_codes() {
        assert_eq!(
            CommandError::NoStreamsForPrefix {
                group: "app".into(),
                prefix: "x".into()
            }
            .exit_code(),
            3
        );
        assert_eq!(CommandError::Resolve(ResolveError::NoGroups).exit_code(), 4);
        assert_eq!(CommandError::InvalidArgument("bad".into()).exit_code(), 2);
        assert_eq!(
            CommandError::GroupsFailed {
                failed: vec!["a".into()],
                total: 2
            }
            .exit_code(),
            1
        );

        let bad_regex = compile_pattern("(").unwrap_err();
        assert_eq!(CommandError::Resolve(bad_regex).exit_code(), 2);
    }

    #[test]
    fn test_prefix_hint_names_streams_command() {
        let err = CommandError::NoStreamsForPrefix {
            group: "app".into(),
            prefix: "missing".into(),
        };
        assert_eq!(err.hint().as_deref(), Some("To view available streams: `saw streams app`"));
    }

    #[tokio::test]
    async fn test_plain_target_skips_listing() {
        let service = MemoryLogService::new();
        let (ctx, _rx) = context(&service);

        let groups = resolve_targets(&ctx, &target("anything", false, false)).await.unwrap();
        assert_eq!(groups, vec!["anything"]);
    }

    #[tokio::test]
    async fn test_regex_target_expands() {
        let service = MemoryLogService::new();
        service.put_group("/app/api");
        service.put_group("/app/worker");
        service.put_group("/other");
        let (ctx, _rx) = context(&service);

        let groups = resolve_targets(&ctx, &target("^/app/", false, true)).await.unwrap();
        assert_eq!(groups, vec!["/app/api", "/app/worker"]);
    }

    #[tokio::test]
    async fn test_fuzzy_target_ambiguous() {
        let service = MemoryLogService::new();
        service.put_group("/app/api");
        service.put_group("/app/worker");
        let (ctx, _rx) = context(&service);

        let err = resolve_targets(&ctx, &target("app", true, false)).await.unwrap_err();
        assert!(matches!(err, CommandError::Resolve(ResolveError::TooManyMatches { .. })));
        assert_eq!(err.exit_code(), 4);
    }

    #[tokio::test]
    async fn test_prefix_scope_with_no_streams() {
        let service = MemoryLogService::new();
        service.put_stream("app", "api-1", Some(10));
        let (ctx, _rx) = context(&service);

        let scope = StreamScope {
            prefix: Some("missing".to_string()),
            streams: Vec::new(),
        };
        let err = resolve_scope(&ctx, "app", &scope).await.unwrap_err();
        assert!(matches!(err, CommandError::NoStreamsForPrefix { .. }));
    }

    #[tokio::test]
    async fn test_prefix_scope_selects_matching_streams() {
        let service = MemoryLogService::new();
        service.put_stream("app", "api-1", Some(10));
        service.put_stream("app", "api-2", Some(20));
        service.put_stream("app", "worker-1", Some(30));
        let (ctx, _rx) = context(&service);

        let scope = StreamScope {
            prefix: Some("api".to_string()),
            streams: Vec::new(),
        };
        let names = resolve_scope(&ctx, "app", &scope).await.unwrap().unwrap();
        assert_eq!(names, vec!["api-2", "api-1"]);
    }

    #[tokio::test]
    async fn test_explicit_streams_over_limit() {
        let service = MemoryLogService::new();
        let (ctx, _rx) = context(&service);

        let scope = StreamScope {
            prefix: None,
            streams: (0..=MAX_FILTER_STREAMS).map(|i| format!("s{}", i)).collect(),
        };
        let err = resolve_scope(&ctx, "app", &scope).await.unwrap_err();
        assert_eq!(err.exit_code(), 2);
    }

    #[tokio::test]
    async fn test_for_each_group_isolates_failures() {
        let groups = vec!["good".to_string(), "bad".to_string(), "fine".to_string()];

        let result = for_each_group(groups, |group| async move {
            if group == "bad" {
                Err(CommandError::InvalidArgument("boom".into()))
            } else {
                Ok(())
            }
        })
        .await;

        match result {
            Err(CommandError::GroupsFailed { failed, total }) => {
                assert_eq!(failed, vec!["bad"]);
                assert_eq!(total, 3);
            }
            other => panic!("expected group failure, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_failed_group_reported_while_sibling_runs() {
        let groups = vec!["bad".to_string(), "forever".to_string()];
        let sibling_done = CancellationToken::new();
        let mut reported = Vec::new();

        let op = {
            let sibling_done = sibling_done.clone();
            move |group: String| {
                let sibling_done = sibling_done.clone();
                async move {
                    if group == "bad" {
                        return Err(CommandError::InvalidArgument("boom".into()));
                    }
                    // Only ends once the failure has been reported
                    sibling_done.cancelled().await;
                    Ok(())
                }
            }
        };

        let result = tokio::time::timeout(
            std::time::Duration::from_secs(5),
            run_groups(groups, op, |group, _err| {
                reported.push(group.to_string());
                sibling_done.cancel();
            }),
        )
        .await
        .expect("failure was not reported while the sibling was running");

        assert_eq!(reported, vec!["bad"]);
        assert!(matches!(result, Err(CommandError::GroupsFailed { .. })));
    }

    #[tokio::test]
    async fn test_interrupted_groups_keep_interrupt_exit_code() {
        let groups = vec!["a".to_string(), "b".to_string()];
        let result = for_each_group(groups, |_group| async {
            Err::<(), _>(CommandError::Interrupted)
        })
        .await;

        let err = result.unwrap_err();
        assert!(matches!(err, CommandError::Interrupted));
        assert_eq!(err.exit_code(), exit_code::INTERRUPTED);

        let single = for_each_group(vec!["a".to_string()], |_group| async {
            Err::<(), _>(CommandError::Interrupted)
        })
        .await;
        assert_eq!(single.unwrap_err().exit_code(), exit_code::INTERRUPTED);
    }

    #[tokio::test]
    async fn test_failure_outranks_interrupt() {
        let groups = vec!["bad".to_string(), "stopped".to_string()];
        let result = for_each_group(groups, |group| async move {
            if group == "bad" {
                Err::<(), _>(CommandError::InvalidArgument("boom".into()))
            } else {
                Err(CommandError::Interrupted)
            }
        })
        .await;

        assert_eq!(result.unwrap_err().exit_code(), exit_code::REMOTE);
    }

    #[tokio::test]
    async fn test_for_each_group_single_keeps_error() {
        let result = for_each_group(vec!["only".to_string()], |group| async move {
            Err(CommandError::NoStreamsForPrefix {
                group,
                prefix: "p".into(),
            })
        })
        .await;

        assert_eq!(result.unwrap_err().exit_code(), 3);
    }
}
