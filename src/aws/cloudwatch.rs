//! CloudWatch metrics adapter

use crate::aws::{to_chrono, to_smithy};
use crate::domain::ports::{Datapoint, MetricQuery, MetricsSource, Statistic};
use crate::error::{Error, Result};
use async_trait::async_trait;
use aws_sdk_cloudwatch::error::DisplayErrorContext;
use aws_sdk_cloudwatch::types::{Dimension, StandardUnit, Statistic as CwStatistic};
use aws_sdk_cloudwatch::Client;
use tracing::debug;

/// CloudWatch client bound to one region
pub struct CloudWatchMetrics {
    client: Client,
}

impl CloudWatchMetrics {
    pub fn new(client: Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl MetricsSource for CloudWatchMetrics {
    async fn get_statistics(&self, query: &MetricQuery) -> Result<Vec<Datapoint>> {
        let dimensions = query
            .dimensions
            .iter()
            .map(|d| Dimension::builder().name(&d.name).value(&d.value).build())
            .collect();
        let statistics = query
            .statistics
            .iter()
            .map(|s| match s {
                Statistic::Average => CwStatistic::Average,
                Statistic::Maximum => CwStatistic::Maximum,
            })
            .collect();

        let output = self
            .client
            .get_metric_statistics()
            .namespace(&query.namespace)
            .metric_name(&query.metric_name)
            .set_dimensions(Some(dimensions))
            .start_time(to_smithy(query.start))
            .end_time(to_smithy(query.end))
            .period(query.period_secs)
            .set_statistics(Some(statistics))
            .unit(StandardUnit::from(query.unit.as_str()))
            .send()
            .await
            .map_err(|e| Error::aws("cloudwatch", "GetMetricStatistics", DisplayErrorContext(&e)))?;

        let points: Vec<Datapoint> = output
            .datapoints()
            .iter()
            .filter_map(|dp| {
                let timestamp = dp.timestamp().and_then(to_chrono)?;
                Some(Datapoint {
                    timestamp,
                    average: dp.average(),
                    maximum: dp.maximum(),
                })
            })
            .collect();

        debug!(
            "{} {:?}: {} datapoints",
            query.metric_name,
            query.dimensions,
            points.len()
        );
        Ok(points)
    }
}
