pub(crate) mod metrics_endpoint;
