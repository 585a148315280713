//! 레코드 보강 -- 타임스탬프, 출처, 태그 부착
//!
//! 같은 배치의 레코드는 모두 같은 타임스탬프를 받습니다.
//! 타임스탬프는 수집 시각이며, 레코드 안의 이벤트 시각과 무관합니다.

use std::net::IpAddr;

use chrono::{DateTime, Utc};
use oslog_core::types::{EnrichedRecord, EntryTag, RecordPayload};

/// 디코딩된 레코드에 메타데이터를 붙이는 보강기
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RecordEnricher {
    source: Option<IpAddr>,
    tag: EntryTag,
}

impl RecordEnricher {
    /// 새 보강기를 생성합니다.
    pub fn new(source: Option<IpAddr>, tag: EntryTag) -> Self {
        Self { source, tag }
    }

    /// 출처 주소
    pub fn source(&self) -> Option<IpAddr> {
        self.source
    }

    /// 라우팅 태그
    pub fn tag(&self) -> EntryTag {
        self.tag
    }

    /// 현재 시각으로 배치를 보강합니다.
    pub fn enrich(&self, batch: Vec<RecordPayload>) -> Vec<EnrichedRecord> {
        self.enrich_at(batch, Utc::now())
    }

    /// 주어진 시각으로 배치를 보강합니다. 순서와 개수는 유지됩니다.
    pub fn enrich_at(&self, batch: Vec<RecordPayload>, timestamp: DateTime<Utc>) -> Vec<EnrichedRecord> {
        batch
            .into_iter()
            .map(|payload| EnrichedRecord {
                payload,
                timestamp,
                source: self.source,
                tag: self.tag,
            })
            .collect()
    }
}
