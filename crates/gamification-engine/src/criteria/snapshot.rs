//! 赛季快照

use crate::models::{Evaluation, Season, XpLedgerEntry, XpSourceType};

/// 员工在单个赛季内的评价与流水
///
/// 评价按 (occurred_at, id) 升序排列，保证连续五星统计与数据来源顺序无关
#[derive(Debug, Clone, Default)]
pub struct EvaluationSnapshot {
    evaluations: Vec<Evaluation>,
    ledger: Vec<XpLedgerEntry>,
}

impl EvaluationSnapshot {
    /// 直接由评价和流水构建，不做时间窗口过滤
    pub fn new(mut evaluations: Vec<Evaluation>, ledger: Vec<XpLedgerEntry>) -> Self {
        evaluations.sort_by_key(|e| (e.occurred_at, e.id));
        Self {
            evaluations,
            ledger,
        }
    }

    /// 构建赛季快照，窗口外的记录被丢弃
    pub fn for_season(
        season: &Season,
        evaluations: Vec<Evaluation>,
        ledger: Vec<XpLedgerEntry>,
    ) -> Self {
        let evaluations = evaluations
            .into_iter()
            .filter(|e| season.contains(e.occurred_at))
            .collect();
        let ledger = ledger
            .into_iter()
            .filter(|e| season.contains(e.occurred_at))
            .collect();
        Self::new(evaluations, ledger)
    }

    pub fn evaluations(&self) -> &[Evaluation] {
        &self.evaluations
    }

    pub fn evaluation_count(&self) -> usize {
        self.evaluations.len()
    }

    /// 计入 XP 阈值的累计值（评价 + 手工调整，不含成就奖励）
    pub fn qualifying_xp(&self) -> f64 {
        self.sum_where(|source| source.counts_toward_threshold())
    }

    /// 成就奖励 XP
    pub fn achievement_xp(&self) -> f64 {
        self.sum_where(|source| source == XpSourceType::Achievement)
    }

    pub fn total_xp(&self) -> f64 {
        self.sum_where(|_| true)
    }

    fn sum_where(&self, include: impl Fn(XpSourceType) -> bool) -> f64 {
        self.ledger
            .iter()
            .filter(|e| include(e.source_type))
            .map(|e| e.final_points)
            .sum()
    }

    /// 平均评分，没有评价时为 None
    pub fn average_rating(&self) -> Option<f64> {
        if self.evaluations.is_empty() {
            return None;
        }
        let sum: i64 = self.evaluations.iter().map(|e| i64::from(e.rating)).sum();
        Some(sum as f64 / self.evaluations.len() as f64)
    }

    /// 最长连续五星次数
    ///
    /// 统计整个赛季内的最大连续段，而不是截至最近一次评价的当前连续数
    pub fn max_five_star_streak(&self) -> u32 {
        let mut current = 0u32;
        let mut best = 0u32;
        for evaluation in &self.evaluations {
            if evaluation.is_five_star() {
                current += 1;
                best = best.max(current);
            } else {
                current = 0;
            }
        }
        best
    }
}
