use issue_server::{Server, config::IssueServerConfig, init_tracing, sentry_init_once};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    sentry_init_once("issue-server");
    init_tracing();

    let config = IssueServerConfig::from_env()?;
    Server::run(config).await
}
