//! 解析セッションの状態
//!
//! `Idle → Submitting → {Success | Failed} → Idle`
//!
//! 送信中のリセットでは実行中の呼び出しは中断されず、到着した結果が破棄される。

use crate::error::{DefectAiError, ErrorKind};
use defect_ai_common::{AnalysisReport, AnalysisRequest};
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum SessionState {
    #[default]
    Idle,
    Submitting {
        request: AnalysisRequest,
    },
    Success {
        request: AnalysisRequest,
        report: AnalysisReport,
    },
    Failed {
        kind: ErrorKind,
        message: String,
    },
}

/// 送信中の解析を識別するチケット
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Ticket {
    generation: u64,
}

#[derive(Error, Debug, PartialEq, Eq)]
#[error("Анализ уже выполняется")]
pub struct AnalysisInProgress;

#[derive(Debug, Default)]
pub struct Session {
    state: SessionState,
    generation: u64,
}

impl Session {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> &SessionState {
        &self.state
    }

    pub fn is_submitting(&self) -> bool {
        matches!(self.state, SessionState::Submitting { .. })
    }

    /// 送信開始（同時に実行できる解析は1件のみ）
    ///
    /// 前回の結果・エラーは破棄される。
    pub fn begin(&mut self, request: AnalysisRequest) -> Result<Ticket, AnalysisInProgress> {
        if self.is_submitting() {
            return Err(AnalysisInProgress);
        }

        self.generation += 1;
        self.state = SessionState::Submitting { request };
        Ok(Ticket {
            generation: self.generation,
        })
    }

    /// 解析結果を反映
    ///
    /// リセット後に届いた古い結果は破棄して false を返す。
    pub fn complete(
        &mut self,
        ticket: Ticket,
        outcome: Result<AnalysisReport, &DefectAiError>,
    ) -> bool {
        if ticket.generation != self.generation || !self.is_submitting() {
            tracing::debug!(ticket = ticket.generation, current = self.generation, "stale result discarded");
            return false;
        }

        let SessionState::Submitting { request } = std::mem::take(&mut self.state) else {
            return false;
        };

        self.state = match outcome {
            Ok(report) => SessionState::Success { request, report },
            Err(err) => SessionState::Failed {
                kind: err.kind(),
                message: err.user_message(),
            },
        };
        true
    }

    pub fn reset(&mut self) {
        self.generation += 1;
        self.state = SessionState::Idle;
    }

    pub fn report(&self) -> Option<&AnalysisReport> {
        match &self.state {
            SessionState::Success { report, .. } => Some(report),
            _ => None,
        }
    }

    pub fn request(&self) -> Option<&AnalysisRequest> {
        match &self.state {
            SessionState::Submitting { request } | SessionState::Success { request, .. } => {
                Some(request)
            }
            _ => None,
        }
    }

    pub fn failure(&self) -> Option<(ErrorKind, &str)> {
        match &self.state {
            SessionState::Failed { kind, message } => Some((*kind, message.as_str())),
            _ => None,
        }
    }
}
