//! 플레이어 통계 -- 디렉토리 조회와 통계 스냅샷 읽기
//!
//! - [`PlayerDirectory`]: 플레이어 이름 → UUID (usercache.json)
//! - [`StatsReader`]: UUID → 자원별 누적 채굴 수 (world/stats/<uuid>.json)
//!
//! 두 파일 모두 게임 서버가 통째로 다시 쓰는 스냅샷이며, 이 크레이트는 읽기만 합니다.

pub mod directory;
pub mod reader;

pub use directory::PlayerDirectory;
pub use reader::StatsReader;
