//! Adaptive colour quantization.
//!
//! Representative colours are chosen from the image's own colour
//! distribution with a deterministic weighted k-means over the distinct
//! colours, seeded farthest-point from the median-luma colour. The same
//! input always yields the same palette.

use crate::palette_store::Rgb;
use rayon::prelude::*;
use std::collections::HashMap;

const MAX_ITERATIONS: usize = 24;

/// One distinct source colour and how many pixels carry it.
#[derive(Debug, Clone, Copy)]
struct Sample {
    rgb: Rgb,
    color: [f32; 3],
    weight: f64,
}

#[derive(Clone)]
struct Center {
    color: [f32; 3],
    sum: [f64; 3],
    weight: f64,
}

impl Center {
    fn new(color: [f32; 3]) -> Self {
        Self {
            color,
            sum: [0.0; 3],
            weight: 0.0,
        }
    }

    fn add_sample(&mut self, sample: &Sample) {
        for c in 0..3 {
            self.sum[c] += sample.color[c] as f64 * sample.weight;
        }
        self.weight += sample.weight;
    }

    fn update_centroid(&mut self) {
        if self.weight > 0.0 {
            for c in 0..3 {
                self.color[c] = (self.sum[c] / self.weight) as f32;
            }
        }
        self.sum = [0.0; 3];
        self.weight = 0.0;
    }
}

fn dist_sq(a: [f32; 3], b: [f32; 3]) -> f32 {
    let dr = a[0] - b[0];
    let dg = a[1] - b[1];
    let db = a[2] - b[2];
    dr * dr + dg * dg + db * db
}

fn luma(rgb: Rgb) -> u32 {
    299 * rgb[0] as u32 + 587 * rgb[1] as u32 + 114 * rgb[2] as u32
}

fn to_u8(channel: f32) -> u8 {
    channel.round().clamp(0.0, 255.0) as u8
}

fn nearest_center(color: [f32; 3], centers: &[Center]) -> usize {
    let mut best_idx = 0;
    let mut best_dist = f32::MAX;
    for (i, center) in centers.iter().enumerate() {
        let dist = dist_sq(color, center.color);
        if dist < best_dist {
            best_dist = dist;
            best_idx = i;
        }
    }
    best_idx
}

/// Distinct colours with pixel counts, sorted by colour value.
fn collect_samples(pixels: &[Rgb]) -> Vec<Sample> {
    let mut counts: HashMap<Rgb, u64> = HashMap::new();
    for &px in pixels {
        *counts.entry(px).or_insert(0) += 1;
    }
    let mut samples: Vec<Sample> = counts
        .into_iter()
        .map(|(rgb, count)| Sample {
            rgb,
            color: [rgb[0] as f32, rgb[1] as f32, rgb[2] as f32],
            weight: count as f64,
        })
        .collect();
    samples.sort_by_key(|s| s.rgb);
    samples
}

/// Farthest-point seeding starting at the weighted median-luma colour.
fn seed_centers(samples: &[Sample], k: usize) -> Vec<Center> {
    let mut by_luma: Vec<usize> = (0..samples.len()).collect();
    by_luma.sort_by_key(|&i| (luma(samples[i].rgb), samples[i].rgb));
    let total: f64 = samples.iter().map(|s| s.weight).sum();
    let mut acc = 0.0;
    let mut first = by_luma[0];
    for &i in &by_luma {
        acc += samples[i].weight;
        if acc * 2.0 >= total {
            first = i;
            break;
        }
    }

    let mut centers = Vec::with_capacity(k);
    let mut chosen = vec![false; samples.len()];
    centers.push(Center::new(samples[first].color));
    chosen[first] = true;

    let mut min_distances: Vec<f32> = samples
        .par_iter()
        .map(|s| dist_sq(s.color, samples[first].color))
        .collect();

    while centers.len() < k {
        let best = min_distances
            .iter()
            .enumerate()
            .filter(|(i, _)| !chosen[*i])
            .fold(None::<(usize, f32)>, |best, (i, &d)| match best {
                Some((_, best_d)) if d <= best_d => best,
                _ => Some((i, d)),
            });
        let Some((best_idx, _)) = best else {
            break;
        };

        chosen[best_idx] = true;
        let new_color = samples[best_idx].color;
        min_distances
            .par_iter_mut()
            .zip(samples.par_iter())
            .for_each(|(min_d, s)| {
                let d = dist_sq(s.color, new_color);
                if d < *min_d {
                    *min_d = d;
                }
            });
        centers.push(Center::new(new_color));
    }

    centers
}

/// Reduce `pixels` to at most `max_colors` distinct colours.
///
/// Images that already use `max_colors` or fewer colours come back unchanged.
pub fn quantize(pixels: &[Rgb], max_colors: usize) -> Vec<Rgb> {
    if pixels.is_empty() || max_colors == 0 {
        return Vec::new();
    }

    let samples = collect_samples(pixels);
    if samples.len() <= max_colors {
        return pixels.to_vec();
    }

    let mut centers = seed_centers(&samples, max_colors);
    let mut labels = vec![usize::MAX; samples.len()];

    for _ in 0..MAX_ITERATIONS {
        let new_labels: Vec<usize> = samples
            .par_iter()
            .map(|s| nearest_center(s.color, &centers))
            .collect();

        let changed = new_labels
            .iter()
            .zip(labels.iter())
            .filter(|(a, b)| a != b)
            .count();
        labels = new_labels;
        if changed == 0 {
            break;
        }

        for (sample, &label) in samples.iter().zip(labels.iter()) {
            centers[label].add_sample(sample);
        }
        for center in &mut centers {
            center.update_centroid();
        }
    }

    let representatives: Vec<Rgb> = centers
        .iter()
        .map(|c| [to_u8(c.color[0]), to_u8(c.color[1]), to_u8(c.color[2])])
        .collect();

    let lookup: HashMap<Rgb, Rgb> = samples
        .par_iter()
        .map(|s| (s.rgb, representatives[nearest_center(s.color, &centers)]))
        .collect();

    pixels
        .par_iter()
        .map(|px| lookup.get(px).copied().unwrap_or(*px))
        .collect()
}
