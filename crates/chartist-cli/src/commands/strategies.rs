//! 전략 목록 명령어.

use std::fmt::Write as _;

use chartist_strategy::{available_strategies, StrategyMeta};

/// 사용 가능한 전략 표.
pub fn format_strategies(strategies: &[&StrategyMeta]) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "사용 가능한 전략 목록:");
    let _ = writeln!(out, "═══════════════════════════════════════════════════════════════");
    let _ = writeln!(out, "  {:<20} | {:<12} | 설명", "전략 타입", "별칭");
    let _ = writeln!(out, "  ─────────────────────────────────────────────────────────────");
    for meta in strategies {
        let aliases = if meta.aliases.is_empty() {
            "-".to_string()
        } else {
            meta.aliases.join(", ")
        };
        let _ = writeln!(
            out,
            "  {:<20} | {:<12} | {} ({})",
            meta.id, aliases, meta.name, meta.description
        );
    }
    let _ = writeln!(out, "═══════════════════════════════════════════════════════════════");
    let _ = writeln!(out);
    let _ = writeln!(out, "예시 설정 ([strategy] 섹션):");
    let _ = writeln!(out, "  type = \"patterns\"");
    let _ = writeln!(out, "  [strategy.params]");
    let _ = writeln!(out, "  lookback = 120");
    let _ = write!(out, "  enable_m_top = true");
    out
}

/// 사용 가능한 전략 목록을 출력합니다.
pub fn print_available_strategies() {
    println!("{}", format_strategies(&available_strategies()));
}
