// src/main.rs

use axum::serve;
use clap::Parser;
use futures::future::join_all;
use std::sync::Arc;
use tokio::net::TcpListener;
use tokio::signal;
use tracing::{error, info};

use retail_media::api::{router, AppState};
use retail_media::model::auction::AuctionRequest;
use retail_media::model::events::{EventBatch, Impression, Purchase, PurchaseItem};
use retail_media::{ApiClient, ClientConfig, ClientRegistry};

#[derive(Parser, Debug)]
#[command(author = "whiteCcinn", version = "1.0", about = "A simulated retail-media ad server")]
struct CliArgs {
    #[arg(short, long, default_value_t = 8080)]
    port: u16,
    #[arg(long, default_value = "logs")]
    log_dir: String,
    /// JSON 配置文件（缺省字段取默认值）
    #[arg(long)]
    config: Option<String>,
    /// 随机种子，便于复现竞价与故障
    #[arg(long)]
    seed: Option<u64>,
    /// 启动即开启故障注入，取值为注入概率
    #[arg(long)]
    error_rate: Option<f64>,
    /// 启动时自动初始化客户端使用的凭证
    #[arg(long)]
    credential: Option<String>,
    /// 启动后跑一遍演示流程（竞价 → 曝光 → 购买 → 再竞价）
    #[arg(long, default_value_t = false)]
    demo: bool,
}

fn load_config(args: &CliArgs) -> Result<ClientConfig, retail_media::ConfigError> {
    let mut config = match &args.config {
        Some(path) => ClientConfig::from_json_file(path)?,
        None => ClientConfig::default(),
    };
    if args.seed.is_some() {
        config.seed = args.seed;
    }
    if let Some(rate) = args.error_rate {
        config.error_simulation = true;
        config.error_rate = rate;
    }
    config.validate()?;
    Ok(config)
}

/// 演示流程：无个性化时竞价 → 上报曝光 → 上报归因购买 → 再次竞价
async fn run_demo(client: &ApiClient) {
    let first = match client.create_auction(&AuctionRequest::listings(3)).await {
        Ok(response) => response,
        Err(err) => {
            error!(%err, "demo auction failed");
            return;
        }
    };
    let Some(top) = first.winners().next().cloned() else {
        return;
    };

    let impressions = EventBatch::default().with_impression(Impression::new(&top.resolved_bid_id, "/demo/search"));
    let purchase = EventBatch::default().with_purchase(
        Purchase::new(vec![PurchaseItem::new(&top.id, 1, 10.0)]).attributed_to(&top.resolved_bid_id),
    );
    for batch in [impressions, purchase] {
        if let Err(err) = client.report_event(batch).await {
            error!(%err, "demo event rejected");
        }
        if let Err(err) = client.flush().await {
            error!(%err, "demo flush failed; events stay queued");
        }
    }

    // 并发发起几次竞价，验证购买后的个性化效果
    let requests: Vec<_> = (0..3).map(|_| AuctionRequest::listings(3)).collect();
    let outcomes = join_all(requests.iter().map(|r| client.create_auction(r))).await;
    for outcome in outcomes {
        match outcome {
            Ok(response) => {
                let ids: Vec<_> = response.winners().map(|w| w.id.as_str()).collect();
                info!(?ids, excluded = %top.id, "demo follow-up auction");
            }
            Err(err) => error!(%err, "demo follow-up auction failed"),
        }
    }

    let status = client.get_status().await;
    info!(status = %serde_json::to_string(&status).unwrap_or_default(), "demo finished");
}

#[tokio::main]
async fn main() {
    let args = CliArgs::parse();

    // 初始化全局 tracing 日志
    let _guard = match retail_media::logging::init_tracing(&args.log_dir, "retail_media.json") {
        Ok(guard) => guard,
        Err(err) => {
            eprintln!("Unable to set global tracing subscriber: {}", err);
            std::process::exit(1);
        }
    };

    let config = match load_config(&args) {
        Ok(config) => config,
        Err(err) => {
            error!(%err, "invalid configuration");
            eprintln!("{}", err);
            std::process::exit(2);
        }
    };
    info!(?config, "retail media server starting on port {}", args.port);

    let registry = match ClientRegistry::new(config) {
        Ok(registry) => Arc::new(registry),
        Err(err) => {
            eprintln!("{}", err);
            std::process::exit(2);
        }
    };

    if let Some(credential) = &args.credential {
        match registry.initialize(credential).await {
            Ok(client) if args.demo => run_demo(&client).await,
            Ok(_) => {}
            Err(err) => error!(%err, "unable to initialize client"),
        }
    }

    let state = Arc::new(AppState {
        registry: registry.clone(),
    });
    let app = router(state);
    let addr = format!("0.0.0.0:{}", args.port);
    let listener = match TcpListener::bind(&addr).await {
        Ok(listener) => listener,
        Err(err) => {
            error!(%err, "unable to bind {}", addr);
            eprintln!("unable to bind {}: {}", addr, err);
            std::process::exit(1);
        }
    };
    info!("retail media server running at http://{}", addr);

    let server = serve(listener, app).with_graceful_shutdown(async {
        let _ = signal::ctrl_c().await;
        info!("Shutting down gracefully...");
    });
    if let Err(err) = server.await {
        error!(%err, "server error");
    }

    // 停止后台上报任务，未上报的事件随进程丢弃
    registry.teardown().await;
    info!("retail media server shut down.");
}
