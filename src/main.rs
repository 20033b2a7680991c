use code_review_ai::cli::args::Args;
use code_review_ai::cli::runner::{emit_outcome, read_input, review_once, EXIT_FAILURE, EXIT_OK};
use code_review_ai::config::Config;
use code_review_ai::infrastructure::logging::setup_logging;
use code_review_ai::review::{RequestController, ReviewService};
use clap::Parser;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    let mut config = Config::new();
    config.update_from_args(&args);

    setup_logging(config.logging_config(args.log_format()))?;

    // 缺少凭据等配置问题在启动阶段直接退出，不接受任何提交
    let service = match ReviewService::from_config(&config) {
        Ok(service) => service,
        Err(e) => {
            tracing::error!(error = %e, "启动失败");
            eprintln!("❌ {}", e);
            std::process::exit(EXIT_FAILURE);
        }
    };

    let (source_kind, input) = read_input(&args, std::io::stdin())?;

    let controller = RequestController::new(service);
    let outcome = review_once(&controller, source_kind, &input).await;

    let code = emit_outcome(outcome, args.output.as_deref(), &mut std::io::stdout())?;
    if code != EXIT_OK {
        std::process::exit(code);
    }
    Ok(())
}
