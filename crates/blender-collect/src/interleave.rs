use blender_core::{BackendResult, BackendSlot, BackendsConfig, BlendConfig, Record, TaggedRecord};

/// Whether blended position `offset` (0-based) belongs to the primary backend.
///
/// Positions `boost_position - 1 .. boost_position - 1 + boost_count` go to the
/// secondary; the primary's first block is stretched by `boost_count` to make
/// up for them. Past the boosted region, or when the boost does not fit in the
/// first block, blocks alternate starting with the primary.
pub fn is_primary_at_offset(offset: usize, cfg: &BlendConfig) -> bool {
    let block_size = cfg.block_size.max(1);
    let boost_count = cfg.boost_count;
    let boost_pos = cfg.boost_position.saturating_sub(1);
    let max_boosted_pos = boost_pos + boost_count;

    let alternating = (offset / block_size) % 2 == 0;
    if boost_count == 0 || offset < boost_pos || max_boosted_pos > block_size {
        return alternating;
    }
    let max_affected_pos = max_boosted_pos.div_ceil(block_size) * block_size + boost_count - 1;
    if offset > max_affected_pos {
        return alternating;
    }

    if offset < boost_pos + boost_count {
        false
    } else {
        offset < block_size + boost_count
    }
}

/// Blend two ranked record lists and return the window `[offset, offset + limit)`.
///
/// When the source chosen for a position is exhausted the other one fills it;
/// generation stops once both are exhausted. An absent source counts as empty.
pub fn interleave(
    primary: Option<&BackendResult>,
    secondary: Option<&BackendResult>,
    offset: usize,
    limit: usize,
    cfg: &BlendConfig,
    backends: &BackendsConfig,
) -> Vec<TaggedRecord> {
    if limit == 0 {
        return Vec::new();
    }
    let primary: &[Record] = primary.map_or(&[][..], |r| r.records.as_slice());
    let secondary: &[Record] = secondary.map_or(&[][..], |r| r.records.as_slice());

    let end = offset.saturating_add(limit).min(primary.len() + secondary.len());
    let mut next = [0usize, 0usize];
    let mut window = Vec::with_capacity(end.saturating_sub(offset));

    for position in 0..end {
        let preferred = if is_primary_at_offset(position, cfg) {
            BackendSlot::Primary
        } else {
            BackendSlot::Secondary
        };
        let slot = if next[index(preferred)] < source(preferred, primary, secondary).len() {
            preferred
        } else {
            preferred.other()
        };
        let record = &source(slot, primary, secondary)[next[index(slot)]];
        next[index(slot)] += 1;

        if position >= offset {
            window.push(TaggedRecord {
                source: slot,
                label: Some(backends.info(slot).display_name().to_string()),
                record: record.clone(),
            });
        }
    }
    window
}

fn index(slot: BackendSlot) -> usize {
    match slot {
        BackendSlot::Primary => 0,
        BackendSlot::Secondary => 1,
    }
}

fn source<'a>(slot: BackendSlot, primary: &'a [Record], secondary: &'a [Record]) -> &'a [Record] {
    match slot {
        BackendSlot::Primary => primary,
        BackendSlot::Secondary => secondary,
    }
}
