//! Deterministic synthetic recordings for demos and tests.

use crate::io::source::{Recording, FIX_GROUP};
use crate::signal::Channel;
use crate::value::RawValue;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rand_distr::{Distribution, StandardNormal};
use std::collections::BTreeMap;
use std::f64::consts::TAU;

/// Generate `minutes` of ECG, PPG and ABP at `fs` Hz.
///
/// The same seed always yields the same samples.
pub fn synthetic_subject(seed: u64, minutes: f64, fs: f64) -> Recording {
    let mut rng = StdRng::seed_from_u64(seed);
    let n = (minutes.max(0.0) * 60.0 * fs).round() as usize;
    let mut noise = |sd: f64| -> f64 {
        let z: f64 = StandardNormal.sample(&mut rng);
        z * sd
    };

    let mut ecg = Vec::with_capacity(n);
    let mut ppg = Vec::with_capacity(n);
    let mut abp = Vec::with_capacity(n);
    for i in 0..n {
        let t = i as f64 / fs;
        ecg.push(0.5 * (TAU * 1.2 * t).sin() + noise(0.05));
        ppg.push(0.8 * (TAU * 1.0 * t).cos() + noise(0.02));
        abp.push(0.6 * (TAU * 1.1 * t + 0.5).sin() + noise(0.03));
    }

    let mut rec = Recording::from_samples(fs, ecg, ppg, abp);
    let mut fix = BTreeMap::new();
    fix.insert("age".to_string(), RawValue::Int(rng.gen_range(18..90)));
    fix.insert("seed".to_string(), RawValue::Int(seed as i64));
    fix.insert(
        "subject_notes".to_string(),
        RawValue::Objects(vec![RawValue::Bytes(b"synthetic recording".to_vec())]),
    );
    rec.metadata.insert_group(FIX_GROUP, fix);
    for ch in Channel::ALL {
        let mut fields = BTreeMap::new();
        fields.insert("fs".to_string(), RawValue::Float(fs));
        fields.insert("unit".to_string(), RawValue::Str(ch.unit().to_string()));
        rec.metadata.insert_group(ch.name(), fields);
    }
    rec
}
