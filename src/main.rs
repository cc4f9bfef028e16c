use anyhow::Result;

use cross_browser_runner::orchestrator::App;
use cross_browser_runner::utils::logging;
use cross_browser_runner::Config;

#[tokio::main]
async fn main() -> Result<()> {
    // 初始化日志
    logging::init();

    // 加载配置
    let config = Config::from_env();

    // 初始化并运行应用
    App::initialize(config).await?.run().await?;

    Ok(())
}
