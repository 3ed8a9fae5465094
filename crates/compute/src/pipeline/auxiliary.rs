//! Point-in-time detectors that compare only the latest two snapshots.
//!
//! Each detector is independent of the others and of the rank pipeline. A
//! missing or zero field skips the detector that needs it.

use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use tracing::info;

use rankwatch_core::{Event, EventType, Severity, Snapshot, StockStatus};
use rankwatch_rules::CompiledDetectionConfig;

use super::EventContext;

const PRICE_MEDIUM_PCT: f64 = 30.0;
const REVIEW_HIGH_DELTA: i64 = 500;

pub fn check_price_change(
    prev: &Snapshot,
    curr: &Snapshot,
    threshold_pct: f64,
    ctx: &EventContext,
) -> Option<Event> {
    let (prev_price, curr_price) = (prev.price?, curr.price?);
    if prev_price <= Decimal::ZERO || curr_price.is_zero() {
        return None;
    }

    let pct = (curr_price - prev_price)
        .checked_div(prev_price)?
        .checked_mul(Decimal::ONE_HUNDRED)?
        .to_f64()?;
    if pct.abs() < threshold_pct {
        return None;
    }

    let severity = if pct.abs() >= PRICE_MEDIUM_PCT {
        Severity::Medium
    } else {
        Severity::Low
    };

    info!(
        product_id = ctx.product_id,
        category_id = ctx.category_id,
        %prev_price,
        %curr_price,
        pct,
        "price change"
    );

    Some(Event {
        prev_price: Some(prev_price),
        curr_price: Some(curr_price),
        price_change_pct: Some(pct),
        ..ctx.event(EventType::PriceChange, severity)
    })
}

pub fn check_review_surge(
    prev: &Snapshot,
    curr: &Snapshot,
    threshold: u32,
    ctx: &EventContext,
) -> Option<Event> {
    let (prev_count, curr_count) = (prev.review_count?, curr.review_count?);
    if prev_count == 0 || curr_count == 0 {
        return None;
    }

    let delta = i64::from(curr_count) - i64::from(prev_count);
    if delta < i64::from(threshold) {
        return None;
    }

    let severity = if delta >= REVIEW_HIGH_DELTA {
        Severity::High
    } else {
        Severity::Medium
    };

    info!(
        product_id = ctx.product_id,
        category_id = ctx.category_id,
        prev_count,
        curr_count,
        delta,
        "review surge"
    );

    Some(Event {
        prev_review_count: Some(prev_count),
        curr_review_count: Some(curr_count),
        review_change: Some(delta),
        ..ctx.event(EventType::ReviewSurge, severity)
    })
}

pub fn check_stock_change(prev: &Snapshot, curr: &Snapshot, ctx: &EventContext) -> Option<Event> {
    let (before, after) = (prev.stock_status, curr.stock_status);
    if before == after {
        return None;
    }
    if before != StockStatus::OutOfStock && after != StockStatus::OutOfStock {
        return None;
    }

    let severity = if after == StockStatus::OutOfStock {
        Severity::High
    } else {
        Severity::Medium
    };

    info!(
        product_id = ctx.product_id,
        category_id = ctx.category_id,
        %before,
        %after,
        "stock change"
    );

    Some(Event {
        prev_stock_status: Some(before),
        curr_stock_status: Some(after),
        ..ctx.event(EventType::StockChange, severity)
    })
}

/// Run every auxiliary detector over the last two snapshots of a sorted series.
pub fn detect_auxiliary(
    sorted: &[Snapshot],
    config: &CompiledDetectionConfig,
    ctx: &EventContext,
) -> Vec<Event> {
    let [.., prev, curr] = sorted else {
        return Vec::new();
    };

    [
        check_price_change(prev, curr, config.price_change_pct_threshold, ctx),
        check_review_surge(prev, curr, config.review_surge_threshold, ctx),
        check_stock_change(prev, curr, ctx),
    ]
    .into_iter()
    .flatten()
    .collect()
}
