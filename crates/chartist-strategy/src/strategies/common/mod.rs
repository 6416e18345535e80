//! 전략 공통 유틸리티.
//!
//! - **pivots**: 피벗 고점/저점 탐지와 가격 군집화
//! - **geometry**: 추세선 투영, 근사 동일 비교, 삼각수렴 꼭짓점 계산
//! - **volume**: 거래량 이동평균

pub mod geometry;
pub mod pivots;
pub mod volume;

pub use geometry::{approx_equal, line_at, solve_triangle, Trendline, Triangle};
pub use pivots::{
    cluster_level, collect_pivots, is_pivot_high, is_pivot_low, pivot_prices, prev_pivot, Cluster,
    PivotKind, PivotPoint,
};
pub use volume::volume_ma;
