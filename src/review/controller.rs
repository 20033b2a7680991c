use std::sync::atomic::{AtomicU64, Ordering};
use tokio::sync::{broadcast, watch};

use crate::infrastructure::error::{ErrorKind, ReviewError};
use crate::review::source::{ReviewRequest, SourceKind};
use crate::review::ReviewService;

/// 每次提交分配的单调递增序号
pub type RequestId = u64;

/// 一次审查的最终结果
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReviewResult {
    Success(String),
    Failure { kind: ErrorKind, message: String },
}

impl ReviewResult {
    /// 失败结果只携带面向用户的文案，内部原因不外泄
    pub fn from_error(error: &ReviewError) -> Self {
        ReviewResult::Failure {
            kind: error.kind(),
            message: error.user_message().to_string(),
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, ReviewResult::Success(_))
    }

    /// 展示层直接渲染的文本
    pub fn text(&self) -> &str {
        match self {
            ReviewResult::Success(text) => text,
            ReviewResult::Failure { message, .. } => message,
        }
    }
}

/// 请求生命周期状态
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum RequestState {
    #[default]
    Idle,
    Pending {
        request_id: RequestId,
    },
    Completed {
        request_id: RequestId,
        result: ReviewResult,
    },
}

impl RequestState {
    pub fn is_pending(&self) -> bool {
        matches!(self, RequestState::Pending { .. })
    }

    pub fn result(&self) -> Option<&ReviewResult> {
        match self {
            RequestState::Completed { result, .. } => Some(result),
            _ => None,
        }
    }
}

/// 校验提示，通过独立通道发出，不占用审查结果通道
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notice {
    pub kind: ErrorKind,
    pub message: String,
}

/// 请求控制器
///
/// 负责校验输入、驱动 解析 → 构建提示词 → 调用模型 的流水线，
/// 并维护 `Idle → Pending → Completed` 状态机。重叠提交时只有最新
/// 序号的响应会被应用，旧响应直接丢弃。
pub struct RequestController {
    service: ReviewService,
    sequence: AtomicU64,
    state_tx: watch::Sender<RequestState>,
    notice_tx: broadcast::Sender<Notice>,
}

impl RequestController {
    /// 只能由已完成配置校验的 `ReviewService` 构造
    pub fn new(service: ReviewService) -> Self {
        let (state_tx, _) = watch::channel(RequestState::Idle);
        let (notice_tx, _) = broadcast::channel(16);

        Self {
            service,
            sequence: AtomicU64::new(0),
            state_tx,
            notice_tx,
        }
    }

    /// 订阅状态变化
    pub fn subscribe(&self) -> watch::Receiver<RequestState> {
        self.state_tx.subscribe()
    }

    /// 订阅校验提示
    pub fn notices(&self) -> broadcast::Receiver<Notice> {
        self.notice_tx.subscribe()
    }

    /// 当前状态快照
    pub fn state(&self) -> RequestState {
        self.state_tx.borrow().clone()
    }

    /// 最近一次发出的序号
    pub fn latest_request_id(&self) -> RequestId {
        self.sequence.load(Ordering::SeqCst)
    }

    /// 提交一次审查
    ///
    /// 结果通过状态订阅观察；校验失败不会进入 Pending。
    pub async fn submit(&self, source_kind: SourceKind, raw_input: &str) {
        let request = match ReviewRequest::new(source_kind, raw_input) {
            Ok(request) => request,
            Err(error) => {
                self.reject(error);
                return;
            }
        };

        let request_id = self.sequence.fetch_add(1, Ordering::SeqCst) + 1;
        self.apply_if_latest(request_id, RequestState::Pending { request_id });

        let result = match self.service.run(request_id, &request).await {
            Ok(text) => ReviewResult::Success(text),
            Err(error) => {
                tracing::error!(request_id, error = %error, "代码审查失败");
                ReviewResult::from_error(&error)
            }
        };

        if !self.apply_if_latest(request_id, RequestState::Completed { request_id, result }) {
            tracing::debug!(request_id, latest = self.latest_request_id(), "丢弃过期的审查结果");
        }
    }

    /// 序号检查与写入在同一把锁内完成
    fn apply_if_latest(&self, request_id: RequestId, next: RequestState) -> bool {
        self.state_tx.send_if_modified(|state| {
            if self.sequence.load(Ordering::SeqCst) != request_id {
                return false;
            }
            *state = next;
            true
        })
    }

    fn reject(&self, error: ReviewError) {
        tracing::warn!(kind = %error.kind(), "输入校验失败: {}", error);

        // 新的提交会丢弃上一次的结果，但不会打断仍在进行的请求
        self.state_tx.send_if_modified(|state| match state {
            RequestState::Completed { .. } => {
                *state = RequestState::Idle;
                true
            }
            _ => false,
        });

        let notice = Notice {
            kind: error.kind(),
            message: error.user_message().to_string(),
        };
        // 没有订阅者时提示会被丢弃
        let _ = self.notice_tx.send(notice);
    }
}
