use super::service::{
    InsightsQuery, LogEvent, LogGroup, LogService, LogStream, Page, QueryResults, QueryStatus,
    Result, ServiceError, StreamOrder, StreamsRequest,
};
use crate::config::types::AwsConfig;
use crate::window::QueryWindow;
use async_trait::async_trait;
use aws_config::BehaviorVersion;
use aws_sdk_cloudwatchlogs::config::Region;
use aws_sdk_cloudwatchlogs::types::OrderBy;
use aws_sdk_cloudwatchlogs::Client;

fn api_error<E>(err: E) -> ServiceError
where
    aws_sdk_cloudwatchlogs::Error: From<E>,
{
    ServiceError::Api(Box::new(aws_sdk_cloudwatchlogs::Error::from(err)))
}

/// CloudWatch Logs backend
#[derive(Debug, Clone)]
pub struct CloudWatchLogs {
    client: Client,
}

impl CloudWatchLogs {
    /// Load credentials and region from the environment, shared config files
    /// and the optional profile/region overrides.
    pub async fn connect(config: &AwsConfig) -> Self {
        let mut loader = aws_config::defaults(BehaviorVersion::latest());
        if let Some(profile) = &config.profile {
            loader = loader.profile_name(profile);
        }
        if let Some(region) = &config.region {
            loader = loader.region(Region::new(region.clone()));
        }

        let sdk_config = loader.load().await;
        tracing::debug!(
            region = ?sdk_config.region(),
            profile = ?config.profile,
            "Loaded AWS configuration"
        );

        Self {
            client: Client::new(&sdk_config),
        }
    }
}

#[async_trait]
impl LogService for CloudWatchLogs {
    async fn describe_log_groups(
        &self,
        prefix: Option<&str>,
        next_token: Option<String>,
    ) -> Result<Page<LogGroup>> {
        let output = self
            .client
            .describe_log_groups()
            .set_log_group_name_prefix(prefix.map(str::to_string))
            .set_next_token(next_token)
            .send()
            .await
            .map_err(api_error)?;

        let items = output
            .log_groups()
            .iter()
            .filter_map(|g| g.log_group_name())
            .map(|name| LogGroup {
                name: name.to_string(),
            })
            .collect();

        Ok(Page {
            items,
            next_token: output.next_token().map(str::to_string),
        })
    }

    async fn describe_log_streams(
        &self,
        request: &StreamsRequest,
        next_token: Option<String>,
    ) -> Result<Page<LogStream>> {
        let order_by = match request.order_by {
            StreamOrder::LogStreamName => OrderBy::LogStreamName,
            StreamOrder::LastEventTime => OrderBy::LastEventTime,
        };

        let output = self
            .client
            .describe_log_streams()
            .log_group_name(&request.group)
            .set_log_stream_name_prefix(request.prefix.clone())
            .order_by(order_by)
            .descending(request.descending)
            .set_next_token(next_token)
            .send()
            .await
            .map_err(api_error)?;

        let items = output
            .log_streams()
            .iter()
            .filter_map(|s| {
                s.log_stream_name().map(|name| LogStream {
                    name: name.to_string(),
                    last_event_timestamp: s.last_event_timestamp(),
                })
            })
            .collect();

        Ok(Page {
            items,
            next_token: output.next_token().map(str::to_string),
        })
    }

    async fn filter_log_events(
        &self,
        window: &QueryWindow,
        next_token: Option<String>,
    ) -> Result<Page<LogEvent>> {
        #[allow(deprecated)]
        let request = self
            .client
            .filter_log_events()
            .interleaved(true)
            .log_group_name(&window.group)
            .start_time(window.start)
            .set_end_time(window.end)
            .set_log_stream_names(window.stream_names.clone())
            .set_filter_pattern(window.filter_pattern.clone())
            .set_next_token(next_token);

        let output = request.send().await.map_err(api_error)?;

        let items = output
            .events()
            .iter()
            .map(|e| {
                Ok(LogEvent {
                    event_id: e
                        .event_id()
                        .ok_or(ServiceError::MissingField("eventId"))?
                        .to_string(),
                    timestamp: e.timestamp().ok_or(ServiceError::MissingField("timestamp"))?,
                    stream_name: e.log_stream_name().unwrap_or_default().to_string(),
                    message: e.message().unwrap_or_default().to_string(),
                })
            })
            .collect::<Result<Vec<_>>>()?;

        Ok(Page {
            items,
            next_token: output.next_token().map(str::to_string),
        })
    }

    async fn start_query(&self, query: &InsightsQuery) -> Result<String> {
        let output = self
            .client
            .start_query()
            .set_log_group_names(Some(query.groups.clone()))
            .start_time(query.start)
            .end_time(query.end)
            .query_string(&query.query)
            .send()
            .await
            .map_err(api_error)?;

        output
            .query_id()
            .map(str::to_string)
            .ok_or(ServiceError::MissingField("queryId"))
    }

    async fn get_query_results(&self, query_id: &str) -> Result<QueryResults> {
        let output = self
            .client
            .get_query_results()
            .query_id(query_id)
            .send()
            .await
            .map_err(api_error)?;

        let status = output
            .status()
            .map(|s| QueryStatus::from_name(s.as_str()))
            .unwrap_or(QueryStatus::Unknown);

        let rows = output
            .results()
            .iter()
            .map(|row| {
                row.iter()
                    .map(|field| {
                        (
                            field.field().unwrap_or_default().to_string(),
                            field.value().unwrap_or_default().to_string(),
                        )
                    })
                    .collect()
            })
            .collect();

        Ok(QueryResults { status, rows })
    }
}
