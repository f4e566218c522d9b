// src/tracker.rs
//
// Greedy IoU tracker. Each detection is matched to the existing track with
// the highest box overlap above a threshold; unmatched detections open new
// tracks with fresh ids, unmatched tracks are dropped after a few misses.

use crate::detection::{iou, Detection};
use tracing::debug;

#[derive(Debug, Clone)]
pub struct Track {
    pub id: u64,
    pub bbox: [f32; 4],
    pub class_id: usize,
    pub confidence: f32,
    misses: u32,
}

pub struct IouTracker {
    tracks: Vec<Track>,
    next_id: u64,
    iou_threshold: f32,
    max_misses: u32,
}

impl IouTracker {
    pub fn new(iou_threshold: f32, max_misses: u32) -> Self {
        Self {
            tracks: Vec::new(),
            next_id: 1,
            iou_threshold,
            max_misses,
        }
    }

    /// Match this frame's detections against live tracks and return the
    /// tracks that are backed by a detection in this frame.
    pub fn update(&mut self, detections: &[Detection]) -> Vec<Track> {
        let mut matched_tracks = vec![false; self.tracks.len()];
        let mut matched_dets = vec![false; detections.len()];

        // Pair off by descending overlap so the strongest matches win.
        let mut pairs = Vec::new();
        for (ti, track) in self.tracks.iter().enumerate() {
            for (di, det) in detections.iter().enumerate() {
                if track.class_id != det.class_id {
                    continue;
                }
                let overlap = iou(&track.bbox, &det.bbox);
                if overlap >= self.iou_threshold {
                    pairs.push((overlap, ti, di));
                }
            }
        }
        pairs.sort_by(|a, b| b.0.partial_cmp(&a.0).unwrap_or(std::cmp::Ordering::Equal));

        for (_, ti, di) in pairs {
            if matched_tracks[ti] || matched_dets[di] {
                continue;
            }
            matched_tracks[ti] = true;
            matched_dets[di] = true;

            let track = &mut self.tracks[ti];
            track.bbox = detections[di].bbox;
            track.confidence = detections[di].confidence;
            track.misses = 0;
        }

        for (ti, matched) in matched_tracks.iter().enumerate() {
            if !matched {
                self.tracks[ti].misses += 1;
            }
        }

        for (di, det) in detections.iter().enumerate() {
            if !matched_dets[di] {
                debug!(
                    id = self.next_id,
                    class = det.class_name(),
                    "opening new track"
                );
                self.tracks.push(Track {
                    id: self.next_id,
                    bbox: det.bbox,
                    class_id: det.class_id,
                    confidence: det.confidence,
                    misses: 0,
                });
                self.next_id += 1;
            }
        }

        let max_misses = self.max_misses;
        self.tracks.retain(|t| t.misses <= max_misses);

        self.tracks
            .iter()
            .filter(|t| t.misses == 0)
            .cloned()
            .collect()
    }
}
