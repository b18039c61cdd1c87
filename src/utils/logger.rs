use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

pub fn init_logger(verbose: bool, json: bool) {
    let filter = if verbose {
        EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| EnvFilter::new("fleet_carrier_cargo=debug,info"))
    } else {
        EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| EnvFilter::new("fleet_carrier_cargo=info"))
    };

    let registry = tracing_subscriber::registry().with(filter);

    if json {
        registry
            .with(
                tracing_subscriber::fmt::layer()
                    .with_target(false)
                    .with_thread_ids(true)
                    .json(),
            )
            .init();
    } else {
        // 多個插件共用同一份狀態，thread id 有助於追蹤是誰觸發了變更
        registry
            .with(
                tracing_subscriber::fmt::layer()
                    .with_target(false)
                    .with_thread_ids(true)
                    .with_file(false)
                    .with_line_number(false)
                    .compact(),
            )
            .init();
    }
}
