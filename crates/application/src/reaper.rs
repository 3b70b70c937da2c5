//! 过期参与者清理任务
//!
//! 每个周期调用一次 [`PresenceManager::sweep_once`]，清除到人则发送离开通知。
//! 一次只清除一个参与者，大量参与者同时过期时需要多个周期才能清理完。

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use domain::ParticipantName;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;

use crate::clock::Clock;
use crate::messaging::{MessageRouter, LEFT_ROOM_TEXT};
use crate::presence::PresenceManager;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReaperConfig {
    /// 两次清理之间的间隔
    pub interval: Duration,
    /// 超过该时长没有心跳即视为离开
    pub ttl: Duration,
}

impl Default for ReaperConfig {
    fn default() -> Self {
        Self {
            interval: Duration::from_secs(15),
            ttl: Duration::from_secs(10),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReaperState {
    Idle,
    Sweeping,
}

/// 单个周期的结果
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TickOutcome {
    Evicted(ParticipantName),
    NothingStale,
    /// 上一次清理仍在进行
    Skipped,
    Failed,
}

pub struct Reaper {
    presence: Arc<PresenceManager>,
    router: Arc<MessageRouter>,
    clock: Arc<dyn Clock>,
    config: ReaperConfig,
    sweeping: AtomicBool,
}

struct SweepGuard<'a>(&'a AtomicBool);

impl Drop for SweepGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

impl Reaper {
    pub fn new(
        presence: Arc<PresenceManager>,
        router: Arc<MessageRouter>,
        clock: Arc<dyn Clock>,
        config: ReaperConfig,
    ) -> Self {
        Self {
            presence,
            router,
            clock,
            config,
            sweeping: AtomicBool::new(false),
        }
    }

    pub fn state(&self) -> ReaperState {
        if self.sweeping.load(Ordering::Acquire) {
            ReaperState::Sweeping
        } else {
            ReaperState::Idle
        }
    }

    /// 执行一次清理；所有错误都在这里记录并吞掉
    pub async fn tick(&self) -> TickOutcome {
        if self
            .sweeping
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            tracing::debug!("上一次清理尚未结束，跳过本周期");
            return TickOutcome::Skipped;
        }
        let _guard = SweepGuard(&self.sweeping);

        let now = self.clock.now();
        let victim = match self.presence.sweep_once(self.config.ttl, now).await {
            Ok(Some(victim)) => victim,
            Ok(None) => return TickOutcome::NothingStale,
            Err(err) => {
                tracing::error!(error = %err, "清理过期参与者失败");
                return TickOutcome::Failed;
            }
        };

        tracing::info!(
            participant = %victim.name,
            last_seen = victim.last_seen,
            "参与者超时，已移出房间"
        );

        if let Err(err) = self
            .router
            .post_system_notice(&victim.name, LEFT_ROOM_TEXT)
            .await
        {
            tracing::error!(
                participant = %victim.name,
                error = %err,
                "写入离开通知失败"
            );
        }

        TickOutcome::Evicted(victim.name)
    }

    /// 启动后台清理任务，第一次清理发生在一个间隔之后
    pub fn start(self: Arc<Self>) -> ReaperHandle {
        let token = CancellationToken::new();
        let cancelled = token.clone();

        let handle = tokio::spawn(async move {
            let mut ticker = tokio::time::interval(self.config.interval);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            // interval 的第一次 tick 立即完成
            ticker.tick().await;

            tracing::info!(
                interval_ms = self.config.interval.as_millis() as u64,
                ttl_ms = self.config.ttl.as_millis() as u64,
                "参与者清理任务启动"
            );

            loop {
                tokio::select! {
                    _ = cancelled.cancelled() => break,
                    _ = ticker.tick() => {
                        self.tick().await;
                    }
                }
            }

            tracing::info!("参与者清理任务停止");
        });

        ReaperHandle { token, handle }
    }
}

/// 后台清理任务的句柄
pub struct ReaperHandle {
    token: CancellationToken,
    handle: JoinHandle<()>,
}

impl ReaperHandle {
    pub fn is_running(&self) -> bool {
        !self.handle.is_finished()
    }

    /// 停止任务；正在进行的清理会先完成
    pub async fn stop(self) {
        self.token.cancel();
        if let Err(err) = self.handle.await {
            tracing::warn!(error = %err, "参与者清理任务异常退出");
        }
    }
}
