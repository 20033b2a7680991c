use anyhow::Context;
use std::io::{Read, Write};
use std::path::Path;
use tokio::sync::{broadcast, watch};

use crate::cli::args::Args;
use crate::review::{Notice, RequestController, RequestState, ReviewResult, SourceKind};

/// 审查成功
pub const EXIT_OK: i32 = 0;
/// 审查失败或启动失败
pub const EXIT_FAILURE: i32 = 1;
/// 输入未通过校验
pub const EXIT_INVALID: i32 = 2;

/// 一次提交在展示层看到的最终结果
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    Review(ReviewResult),
    Rejected(Notice),
}

/// 根据参数确定输入类型与内容；文件和标准输入都按代码片段处理
pub fn read_input<R: Read>(args: &Args, mut stdin: R) -> anyhow::Result<(SourceKind, String)> {
    if let Some(url) = &args.github {
        return Ok((SourceKind::GitHubReference, url.clone()));
    }
    if let Some(code) = &args.code {
        return Ok((SourceKind::InlineCode, code.clone()));
    }
    if let Some(path) = &args.file {
        let code = std::fs::read_to_string(path)
            .with_context(|| format!("无法读取文件 {}", path.display()))?;
        return Ok((SourceKind::InlineCode, code));
    }

    let mut code = String::new();
    stdin
        .read_to_string(&mut code)
        .context("无法读取标准输入")?;
    Ok((SourceKind::InlineCode, code))
}

/// 监听状态与提示，直到得到结果或校验提示
pub async fn wait_for_outcome(
    state_rx: &mut watch::Receiver<RequestState>,
    notice_rx: &mut broadcast::Receiver<Notice>,
) -> Option<Outcome> {
    loop {
        tokio::select! {
            changed = state_rx.changed() => {
                changed.ok()?;
                let state = state_rx.borrow_and_update().clone();
                match state {
                    RequestState::Pending { request_id } => {
                        eprintln!("⏳ 正在审查代码 (#{})...", request_id);
                    }
                    RequestState::Completed { result, .. } => return Some(Outcome::Review(result)),
                    RequestState::Idle => {}
                }
            }
            notice = notice_rx.recv() => {
                match notice {
                    Ok(notice) => return Some(Outcome::Rejected(notice)),
                    Err(broadcast::error::RecvError::Lagged(_)) => continue,
                    Err(broadcast::error::RecvError::Closed) => return None,
                }
            }
        }
    }
}

/// 提交一次审查并等待最终结果
pub async fn review_once(
    controller: &RequestController,
    source_kind: SourceKind,
    input: &str,
) -> Option<Outcome> {
    let mut state_rx = controller.subscribe();
    let mut notice_rx = controller.notices();

    let (_, outcome) = tokio::join!(
        controller.submit(source_kind, input),
        wait_for_outcome(&mut state_rx, &mut notice_rx)
    );
    outcome
}

/// 展示结果并返回退出码
///
/// 成功的审查文本写入 `output` 指定的文件，否则写入 `stdout`；
/// 失败与校验提示写到标准错误。
pub fn emit_outcome<W: Write>(
    outcome: Option<Outcome>,
    output: Option<&Path>,
    stdout: &mut W,
) -> anyhow::Result<i32> {
    match outcome {
        Some(Outcome::Review(ReviewResult::Success(review))) => {
            match output {
                Some(path) => {
                    std::fs::write(path, &review)
                        .with_context(|| format!("无法写入文件 {}", path.display()))?;
                    eprintln!("✅ 代码审查结果已保存到: {}", path.display());
                }
                None => writeln!(stdout, "{}", review)?,
            }
            Ok(EXIT_OK)
        }
        Some(Outcome::Review(failure)) => {
            eprintln!("❌ {}", failure.text());
            Ok(EXIT_FAILURE)
        }
        Some(Outcome::Rejected(notice)) => {
            eprintln!("⚠️  {}", notice.message);
            Ok(EXIT_INVALID)
        }
        None => anyhow::bail!("review controller stopped before producing a result"),
    }
}
