//! 多symbol聚合计算
//!
//! 纯函数，聚合器与读取路径的实时回退共用同一套口径。

use crate::market::types::{
    ConfluenceBreakdown, ConfluenceComponent, MarketOverviewSnapshot, MoverEntry, MoversSnapshot,
    SignalDirection, SignalRecord, SignalsSnapshot, TickerRecord,
};
use crate::time_util;

/// 入选信号的最小24小时涨跌幅（百分比绝对值）
const SIGNAL_CHANGE_THRESHOLD: f64 = 5.0;

/// 共振评分权重
const PRICE_WEIGHT: f64 = 0.7;
const VOLUME_WEIGHT: f64 = 0.3;

/// BTC参考价取现货对
const BTC_REFERENCE_INST_ID: &str = "BTC-USDT";

/// 大盘概览：涨跌家数划分、总成交额、BTC参考价
pub fn overview(tickers: &[TickerRecord]) -> MarketOverviewSnapshot {
    let mut snapshot = MarketOverviewSnapshot {
        updated_at_ms: time_util::now_millis(),
        ..Default::default()
    };

    for t in tickers {
        if t.change_pct_24h > 0.0 {
            snapshot.gainers_count += 1;
        } else if t.change_pct_24h < 0.0 {
            snapshot.losers_count += 1;
        }
        snapshot.total_volume_24h += t.volume_24h;

        if t.inst_id == BTC_REFERENCE_INST_ID && t.last_price > 0.0 {
            snapshot.btc_price = t.last_price;
        }
    }

    // 无现货BTC对时退回任意BTC计价产品（如 BTC-USDT-SWAP）
    if snapshot.btc_price == 0.0 {
        if let Some(t) = tickers
            .iter()
            .find(|t| t.inst_id.starts_with("BTC-USDT") && t.last_price > 0.0)
        {
            snapshot.btc_price = t.last_price;
        }
    }

    snapshot
}

/// 涨跌幅榜：按24小时涨跌幅排序取前depth名
pub fn movers(tickers: &[TickerRecord], depth: usize) -> MoversSnapshot {
    let mut sorted: Vec<&TickerRecord> = tickers.iter().collect();
    sorted.sort_by(|a, b| {
        b.change_pct_24h
            .partial_cmp(&a.change_pct_24h)
            .unwrap_or(std::cmp::Ordering::Equal)
    });

    let to_entry = |t: &TickerRecord| MoverEntry {
        inst_id: t.inst_id.clone(),
        last_price: t.last_price,
        change_pct_24h: t.change_pct_24h,
        volume_24h: t.volume_24h,
    };

    let gainers = sorted
        .iter()
        .filter(|t| t.change_pct_24h > 0.0)
        .take(depth)
        .map(|t| to_entry(t))
        .collect();
    let losers = sorted
        .iter()
        .rev()
        .filter(|t| t.change_pct_24h < 0.0)
        .take(depth)
        .map(|t| to_entry(t))
        .collect();

    MoversSnapshot {
        gainers,
        losers,
        updated_at_ms: time_util::now_millis(),
    }
}

/// 信号汇总：涨跌幅超过阈值的symbol生成动量信号，按强度排序
pub fn signals(tickers: &[TickerRecord], depth: usize) -> SignalsSnapshot {
    let now = time_util::now_millis();
    let mut records: Vec<SignalRecord> = tickers
        .iter()
        .filter(|t| t.change_pct_24h.abs() >= SIGNAL_CHANGE_THRESHOLD)
        .map(|t| SignalRecord {
            inst_id: t.inst_id.clone(),
            direction: if t.change_pct_24h >= 0.0 {
                SignalDirection::Long
            } else {
                SignalDirection::Short
            },
            strength: signal_strength(t.change_pct_24h),
            change_pct_24h: t.change_pct_24h,
            volume_24h: t.volume_24h,
            detected_at_ms: now,
        })
        .collect();

    records.sort_by(|a, b| {
        b.strength
            .partial_cmp(&a.strength)
            .unwrap_or(std::cmp::Ordering::Equal)
    });
    records.truncate(depth);

    SignalsSnapshot {
        signals: records,
        updated_at_ms: now,
    }
}

/// 单symbol共振分解：价格动量与成交额两个维度加权
pub fn confluence(ticker: &TickerRecord) -> ConfluenceBreakdown {
    let price_score = signal_strength(ticker.change_pct_24h);
    let volume_score = volume_strength(ticker.volume_24h);
    let momentum_score = price_score * PRICE_WEIGHT + volume_score * VOLUME_WEIGHT;

    ConfluenceBreakdown {
        inst_id: ticker.inst_id.clone(),
        price_score,
        volume_score,
        momentum_score,
        total_score: momentum_score,
        components: vec![
            ConfluenceComponent {
                name: "price_change_24h".to_string(),
                score: price_score,
                weight: PRICE_WEIGHT,
            },
            ConfluenceComponent {
                name: "volume_24h".to_string(),
                score: volume_score,
                weight: VOLUME_WEIGHT,
            },
        ],
        updated_at_ms: time_util::now_millis(),
    }
}

/// 涨跌幅映射到 0..=100
fn signal_strength(change_pct: f64) -> f64 {
    (change_pct.abs() * 10.0).min(100.0)
}

/// 成交额按数量级映射到 0..=100
fn volume_strength(volume_24h: f64) -> f64 {
    if volume_24h <= 0.0 {
        return 0.0;
    }
    ((volume_24h + 1.0).log10() * 10.0).min(100.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ticker(inst_id: &str, last: f64, change: f64, vol: f64) -> TickerRecord {
        TickerRecord {
            inst_id: inst_id.to_string(),
            inst_type: "SPOT".to_string(),
            last_price: last,
            change_pct_24h: change,
            volume_24h: vol,
            ts_ms: 0,
        }
    }

    #[test]
    fn test_overview_partition() {
        let tickers = vec![
            ticker("BTC-USDT", 85941.8, 1.2, 1_000_000.0),
            ticker("ETH-USDT", 3200.0, -0.5, 500_000.0),
            ticker("SOL-USDT", 150.0, 4.0, 250_000.0),
        ];
        let snapshot = overview(&tickers);

        assert_eq!(snapshot.gainers_count, 2);
        assert_eq!(snapshot.losers_count, 1);
        approx::assert_relative_eq!(snapshot.btc_price, 85941.8);
        approx::assert_relative_eq!(snapshot.total_volume_24h, 1_750_000.0);
    }

    #[test]
    fn test_overview_btc_fallback_to_swap() {
        let tickers = vec![ticker("BTC-USDT-SWAP", 86000.0, 0.8, 900_000.0)];
        let snapshot = overview(&tickers);
        approx::assert_relative_eq!(snapshot.btc_price, 86000.0);
    }

    #[test]
    fn test_movers_sorted_and_partitioned() {
        let tickers = vec![
            ticker("A-USDT", 1.0, 12.0, 10.0),
            ticker("B-USDT", 1.0, -8.0, 10.0),
            ticker("C-USDT", 1.0, 3.0, 10.0),
            ticker("D-USDT", 1.0, -15.0, 10.0),
        ];
        let snapshot = movers(&tickers, 10);

        assert_eq!(snapshot.gainers[0].inst_id, "A-USDT");
        assert_eq!(snapshot.gainers.len(), 2);
        assert_eq!(snapshot.losers[0].inst_id, "D-USDT");
        assert_eq!(snapshot.losers.len(), 2);
    }

    #[test]
    fn test_signals_threshold_and_direction() {
        let tickers = vec![
            ticker("A-USDT", 1.0, 12.0, 10.0),
            ticker("B-USDT", 1.0, -6.0, 10.0),
            ticker("C-USDT", 1.0, 1.0, 10.0),
        ];
        let snapshot = signals(&tickers, 10);

        assert_eq!(snapshot.signals.len(), 2);
        assert_eq!(snapshot.signals[0].inst_id, "A-USDT");
        assert_eq!(snapshot.signals[0].direction, SignalDirection::Long);
        assert_eq!(snapshot.signals[1].direction, SignalDirection::Short);
    }

    #[test]
    fn test_confluence_scores_bounded() {
        let breakdown = confluence(&ticker("BTC-USDT", 85941.8, 25.0, 1e9));
        assert!(breakdown.price_score <= 100.0);
        assert!(breakdown.volume_score <= 100.0);
        assert!(breakdown.total_score > 0.0);
        assert_eq!(breakdown.components.len(), 2);
    }
}
