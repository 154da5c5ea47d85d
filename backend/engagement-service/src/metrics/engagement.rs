use lazy_static::lazy_static;
use prometheus::{
    register_histogram, register_histogram_vec, register_int_counter_vec, Histogram,
    HistogramVec, IntCounterVec,
};

lazy_static! {
    /// Duration of feed requests by sort mode (recency, popularity, shuffle).
    pub static ref FEED_REQUEST_DURATION_SECONDS: HistogramVec = register_histogram_vec!(
        "engagement_feed_request_duration_seconds",
        "Feed request duration segmented by sort mode",
        &["sort"]
    )
    .expect("failed to register engagement_feed_request_duration_seconds");

    /// Total feed requests processed by sort mode.
    pub static ref FEED_REQUEST_TOTAL: IntCounterVec = register_int_counter_vec!(
        "engagement_feed_request_total",
        "Total feed requests segmented by sort mode",
        &["sort"]
    )
    .expect("failed to register engagement_feed_request_total");

    /// Votes cast, by kind and target category.
    pub static ref VOTES_CAST_TOTAL: IntCounterVec = register_int_counter_vec!(
        "engagement_votes_cast_total",
        "Votes cast segmented by kind and target category",
        &["kind", "category"]
    )
    .expect("failed to register engagement_votes_cast_total");

    /// Retractions by target category.
    pub static ref VOTES_RETRACTED_TOTAL: IntCounterVec = register_int_counter_vec!(
        "engagement_votes_retracted_total",
        "Vote retraction requests segmented by target category",
        &["category"]
    )
    .expect("failed to register engagement_votes_retracted_total");

    /// Nodes materialized per comment tree.
    pub static ref COMMENT_TREE_NODES: HistogramVec = register_histogram_vec!(
        "engagement_comment_tree_nodes",
        "Comment nodes materialized per tree segmented by mode",
        &["mode"],
        vec![0.0, 1.0, 5.0, 10.0, 50.0, 100.0, 500.0, 1000.0]
    )
    .expect("failed to register engagement_comment_tree_nodes");

    /// Dashboard summary computation time.
    pub static ref DASHBOARD_DURATION_SECONDS: Histogram = register_histogram!(
        "engagement_dashboard_duration_seconds",
        "Dashboard summary computation duration"
    )
    .expect("failed to register engagement_dashboard_duration_seconds");
}
