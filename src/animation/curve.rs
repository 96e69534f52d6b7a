use std::cmp::Ordering;
use std::fs::File;
use std::io::BufReader;
use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering as AtomicOrdering};

use crate::animation::interp::recompute_tangents;
use crate::animation::keyframe::Keyframe;
use crate::animation::notify::{ChangeNotifier, CurveChange, CurveEvent, SubscriptionId};
use crate::animation::outside::{MappedTime, OutsideCurveBehavior};
use crate::foundation::error::{CurveError, CurveResult, ensure_finite_time};

/// One animated scalar channel: time-ordered keyframes plus extrapolation rules.
///
/// Keyframe times are unique and compared exactly. Mutations recompute the automatic tangents of
/// the touched keyframe and its immediate neighbors, bump [`Curve::revision`], and notify
/// subscribers once the change is fully applied.
///
/// Sampling takes `&self` and may run from many threads at once; the only state it touches is a
/// lock-free segment hint that speeds up monotonic playback without affecting results.
pub struct Curve {
    points: Vec<Keyframe>,
    pre: OutsideCurveBehavior,
    post: OutsideCurveBehavior,
    component: u32,
    notifications_enabled: bool,
    revision: u64,
    hint: AtomicUsize,
    notifier: ChangeNotifier,
}

impl Default for Curve {
    fn default() -> Self {
        Self::new()
    }
}

impl Clone for Curve {
    /// Clones the keyframes and settings; subscribers stay with the original.
    fn clone(&self) -> Self {
        Self {
            points: self.points.clone(),
            pre: self.pre,
            post: self.post,
            component: self.component,
            notifications_enabled: self.notifications_enabled,
            revision: self.revision,
            hint: AtomicUsize::new(0),
            notifier: ChangeNotifier::default(),
        }
    }
}

impl std::fmt::Debug for Curve {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Curve")
            .field("component", &self.component)
            .field("pre", &self.pre)
            .field("post", &self.post)
            .field("revision", &self.revision)
            .field("points", &self.points)
            .field("notifier", &self.notifier)
            .finish()
    }
}

impl PartialEq for Curve {
    /// Curves are equal when they would persist identically.
    fn eq(&self, other: &Self) -> bool {
        self.component == other.component
            && self.pre == other.pre
            && self.post == other.post
            && self.points == other.points
    }
}

impl Curve {
    /// Empty curve holding its boundary values outside the keyframed span.
    pub fn new() -> Self {
        Self {
            points: Vec::new(),
            pre: OutsideCurveBehavior::Constant,
            post: OutsideCurveBehavior::Constant,
            component: 0,
            notifications_enabled: true,
            revision: 0,
            hint: AtomicUsize::new(0),
            notifier: ChangeNotifier::default(),
        }
    }

    /// Empty curve for one component of a multi-component value.
    pub fn with_component(component: u32) -> Self {
        Self {
            component,
            ..Self::new()
        }
    }

    /// Build a curve from keyframes in any order.
    ///
    /// Rejects non-finite data and duplicate times, then recomputes every automatic tangent.
    pub fn from_points(points: impl IntoIterator<Item = Keyframe>) -> CurveResult<Self> {
        let mut points = points
            .into_iter()
            .map(|mut k| -> CurveResult<Keyframe> {
                k.time = ensure_finite_time(k.time)?;
                k.validate()?;
                Ok(k)
            })
            .collect::<CurveResult<Vec<_>>>()?;
        points.sort_by(|a, b| a.time.total_cmp(&b.time));
        if let Some(dup) = points.windows(2).find(|w| w[0].time == w[1].time) {
            return Err(CurveError::KeyCollision(dup[0].time));
        }
        for i in 0..points.len() {
            recompute_tangents(&mut points, i);
        }
        Ok(Self {
            points,
            ..Self::new()
        })
    }

    /// Keyframes in ascending time order.
    pub fn points(&self) -> &[Keyframe] {
        &self.points
    }

    /// Number of keyframes.
    pub fn len(&self) -> usize {
        self.points.len()
    }

    /// Return `true` when the curve has no keyframes.
    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// Time of the first keyframe.
    pub fn first_time(&self) -> Option<f64> {
        self.points.first().map(|k| k.time)
    }

    /// Time of the last keyframe.
    pub fn last_time(&self) -> Option<f64> {
        self.points.last().map(|k| k.time)
    }

    /// `(first_time, last_time)` when the curve has keyframes.
    pub fn time_range(&self) -> Option<(f64, f64)> {
        Some((self.first_time()?, self.last_time()?))
    }

    /// Index of the scalar component this curve animates.
    pub fn component(&self) -> u32 {
        self.component
    }

    /// Set the component index.
    pub fn set_component(&mut self, component: u32) {
        self.component = component;
    }

    /// Behavior before the first keyframe.
    pub fn pre_mapping(&self) -> OutsideCurveBehavior {
        self.pre
    }

    /// Behavior after the last keyframe.
    pub fn post_mapping(&self) -> OutsideCurveBehavior {
        self.post
    }

    /// Change the behavior before the first keyframe.
    pub fn set_pre_mapping(&mut self, behavior: OutsideCurveBehavior) {
        if self.pre != behavior {
            self.pre = behavior;
            tracing::debug!(?behavior, "pre-curve mapping changed");
            self.commit(CurveChange::MappingChanged);
        }
    }

    /// Change the behavior after the last keyframe.
    pub fn set_post_mapping(&mut self, behavior: OutsideCurveBehavior) {
        if self.post != behavior {
            self.post = behavior;
            tracing::debug!(?behavior, "post-curve mapping changed");
            self.commit(CurveChange::MappingChanged);
        }
    }

    /// Counter bumped once per applied mutation.
    pub fn revision(&self) -> u64 {
        self.revision
    }

    /// Whether subscribers are notified.
    pub fn notifications_enabled(&self) -> bool {
        self.notifications_enabled
    }

    /// Mute or unmute subscribers. The revision keeps counting while muted.
    pub fn set_notifications_enabled(&mut self, enabled: bool) {
        self.notifications_enabled = enabled;
    }

    /// Register an observer called synchronously after each mutation.
    pub fn subscribe(
        &mut self,
        observer: impl Fn(&CurveEvent) + Send + Sync + 'static,
    ) -> SubscriptionId {
        self.notifier.subscribe(Box::new(observer))
    }

    /// Remove an observer. Returns `false` if it was not registered.
    pub fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        self.notifier.unsubscribe(id)
    }

    /// Run several mutations and notify at most once, after `f` returns.
    pub fn batch<R>(&mut self, f: impl FnOnce(&mut Self) -> R) -> R {
        self.notifier.begin_batch();
        let out = f(self);
        self.notifier
            .end_batch(self.revision, self.notifications_enabled);
        out
    }

    fn index_of(&self, time: f64) -> Result<usize, usize> {
        self.points
            .binary_search_by(|k| k.time.partial_cmp(&time).unwrap_or(Ordering::Less))
    }

    /// Return `true` when a keyframe sits exactly at `time`.
    pub fn has_point_at(&self, time: f64) -> bool {
        !time.is_nan() && self.index_of(time).is_ok()
    }

    /// Keyframe at exactly `time`.
    pub fn get_point(&self, time: f64) -> Option<&Keyframe> {
        if time.is_nan() {
            return None;
        }
        self.index_of(time).ok().map(|i| &self.points[i])
    }

    /// Time of the closest keyframe strictly before `time`.
    pub fn previous_time(&self, time: f64) -> Option<f64> {
        if time.is_nan() {
            return None;
        }
        let idx = self.points.partition_point(|k| k.time < time);
        idx.checked_sub(1).map(|i| self.points[i].time)
    }

    /// Time of the closest keyframe strictly after `time`.
    pub fn next_time(&self, time: f64) -> Option<f64> {
        if time.is_nan() {
            return None;
        }
        let idx = self.points.partition_point(|k| k.time <= time);
        self.points.get(idx).map(|k| k.time)
    }

    /// Return `true` when some keyframe lies strictly before `time`.
    pub fn exists_before(&self, time: f64) -> bool {
        self.previous_time(time).is_some()
    }

    /// Return `true` when some keyframe lies strictly after `time`.
    pub fn exists_after(&self, time: f64) -> bool {
        self.next_time(time).is_some()
    }

    /// Insert `point` at `time`, or overwrite the keyframe already there in place.
    ///
    /// `point.time` is ignored in favor of `time`.
    pub fn add_or_update_value(&mut self, time: f64, point: Keyframe) -> CurveResult<()> {
        let time = ensure_finite_time(time)?;
        point.validate()?;
        let point = Keyframe { time, ..point };

        let idx = match self.index_of(time) {
            Ok(i) => {
                self.points[i] = point;
                i
            }
            Err(i) => {
                self.points.insert(i, point);
                i
            }
        };
        self.recompute_span(idx.saturating_sub(1), idx + 1);
        tracing::debug!(time, points = self.points.len(), "keyframe added or updated");
        self.commit(CurveChange::PointsChanged);
        Ok(())
    }

    /// Remove the keyframe at `time`, returning it. Absent times are a no-op.
    pub fn remove_value(&mut self, time: f64) -> CurveResult<Option<Keyframe>> {
        let time = ensure_finite_time(time)?;
        let Ok(idx) = self.index_of(time) else {
            return Ok(None);
        };
        let removed = self.points.remove(idx);
        // The former neighbors now sit at idx - 1 and idx.
        self.recompute_span(idx.saturating_sub(1), idx);
        tracing::debug!(time, points = self.points.len(), "keyframe removed");
        self.commit(CurveChange::PointsChanged);
        Ok(Some(removed))
    }

    /// Re-key the keyframe at `time` to `new_time`, overwriting any keyframe already there.
    ///
    /// Returns `false` without changing anything when no keyframe sits at `time`.
    pub fn move_value(&mut self, time: f64, new_time: f64) -> CurveResult<bool> {
        let time = ensure_finite_time(time)?;
        let new_time = ensure_finite_time(new_time)?;
        let Ok(idx) = self.index_of(time) else {
            return Ok(false);
        };
        if time == new_time {
            return Ok(true);
        }

        let old_prev = idx.checked_sub(1).map(|i| self.points[i].time);
        let old_next = self.points.get(idx + 1).map(|k| k.time);

        let mut point = self.points.remove(idx);
        point.time = new_time;
        let new_idx = match self.index_of(new_time) {
            Ok(i) => {
                self.points[i] = point;
                i
            }
            Err(i) => {
                self.points.insert(i, point);
                i
            }
        };

        self.recompute_span(new_idx.saturating_sub(1), new_idx + 1);
        for t in [old_prev, old_next].into_iter().flatten() {
            if let Ok(i) = self.index_of(t) {
                recompute_tangents(&mut self.points, i);
            }
        }
        tracing::debug!(from = time, to = new_time, "keyframe moved");
        self.commit(CurveChange::PointsChanged);
        Ok(true)
    }

    /// Like [`Curve::move_value`], but refuses to overwrite an existing keyframe.
    pub fn move_value_strict(&mut self, time: f64, new_time: f64) -> CurveResult<bool> {
        let time = ensure_finite_time(time)?;
        let checked = ensure_finite_time(new_time)?;
        if time != checked && self.has_point_at(checked) {
            return Err(CurveError::KeyCollision(checked));
        }
        self.move_value(time, new_time)
    }

    /// Set the editor selection flag of the keyframe at `time`.
    ///
    /// Returns `false` when no keyframe sits at `time`.
    pub fn set_selected(&mut self, time: f64, selected: bool) -> CurveResult<bool> {
        let time = ensure_finite_time(time)?;
        let Ok(idx) = self.index_of(time) else {
            return Ok(false);
        };
        if self.points[idx].selected != selected {
            self.points[idx].selected = selected;
            self.commit(CurveChange::SelectionChanged);
        }
        Ok(true)
    }

    /// Sample the curve at `u`.
    ///
    /// Outside the keyframed span the pre/post behavior remaps `u`; the result is then clamped
    /// into the span, interpolated with the left keyframe's interpolation and shifted by the
    /// mapping offset. A query exactly on a keyframe returns that keyframe's value.
    pub fn sample(&self, u: f64) -> CurveResult<f64> {
        if !u.is_finite() {
            return Err(CurveError::InvalidKey(u));
        }
        let (Some(first), Some(last)) = (self.points.first(), self.points.last()) else {
            return Err(CurveError::EmptyCurve);
        };

        let mapped = if u < first.time {
            self.pre.map(u, &self.points)
        } else if u > last.time {
            self.post.map(u, &self.points)
        } else {
            MappedTime::identity(u)
        };
        let t = mapped.u.clamp(first.time, last.time);
        Ok(self.sample_in_span(t) + mapped.offset)
    }

    /// Sample at each time in `times`.
    pub fn sample_many(&self, times: &[f64]) -> CurveResult<Vec<f64>> {
        times.iter().map(|&u| self.sample(u)).collect()
    }

    fn sample_in_span(&self, t: f64) -> f64 {
        let idx = self.bracket(t);
        let left = &self.points[idx];
        if left.time == t {
            return left.value;
        }
        match self.points.get(idx + 1) {
            Some(right) => left.interpolation.interpolate(left, right, t),
            None => left.value,
        }
    }

    /// Index of the last keyframe at or before `t`.
    fn bracket(&self, t: f64) -> usize {
        let hint = self.hint.load(AtomicOrdering::Relaxed);
        for idx in [hint, hint + 1] {
            if let (Some(l), Some(r)) = (self.points.get(idx), self.points.get(idx + 1))
                && l.time <= t
                && t < r.time
            {
                if idx != hint {
                    self.hint.store(idx, AtomicOrdering::Relaxed);
                }
                return idx;
            }
        }
        let idx = self.points.partition_point(|k| k.time <= t).saturating_sub(1);
        self.hint.store(idx, AtomicOrdering::Relaxed);
        idx
    }

    fn recompute_span(&mut self, lo: usize, hi: usize) {
        let Some(last) = self.points.len().checked_sub(1) else {
            return;
        };
        for i in lo..=hi.min(last) {
            recompute_tangents(&mut self.points, i);
        }
    }

    fn commit(&mut self, change: CurveChange) {
        self.revision += 1;
        *self.hint.get_mut() = 0;
        self.notifier
            .emit(change, self.revision, self.notifications_enabled);
    }

    /// Parse a curve from a JSON reader.
    pub fn from_reader<R: std::io::Read>(r: R) -> CurveResult<Self> {
        serde_json::from_reader(r).map_err(|e| CurveError::serde(format!("parse curve JSON: {e}")))
    }

    /// Parse a curve from a JSON string.
    pub fn from_json_str(s: &str) -> CurveResult<Self> {
        serde_json::from_str(s).map_err(|e| CurveError::serde(format!("parse curve JSON: {e}")))
    }

    /// Parse a curve from a JSON file on disk.
    pub fn from_path(path: impl AsRef<Path>) -> CurveResult<Self> {
        let path = path.as_ref();
        let f = File::open(path).map_err(|e| {
            CurveError::serde(format!("open curve JSON '{}': {e}", path.display()))
        })?;
        Self::from_reader(BufReader::new(f))
    }

    /// Serialize to pretty-printed JSON.
    pub fn to_json_string(&self) -> CurveResult<String> {
        serde_json::to_string_pretty(self)
            .map_err(|e| CurveError::serde(format!("write curve JSON: {e}")))
    }
}

// ----------------------------
// Boundary (serde) structures
// ----------------------------

#[derive(serde::Serialize)]
struct CurveDefRef<'a> {
    component: u32,
    pre: OutsideCurveBehavior,
    post: OutsideCurveBehavior,
    points: &'a [Keyframe],
}

#[derive(serde::Deserialize)]
struct CurveDef {
    #[serde(default)]
    component: u32,
    #[serde(default)]
    pre: OutsideCurveBehavior,
    #[serde(default)]
    post: OutsideCurveBehavior,
    #[serde(default)]
    points: Vec<Keyframe>,
}

impl serde::Serialize for Curve {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        CurveDefRef {
            component: self.component,
            pre: self.pre,
            post: self.post,
            points: &self.points,
        }
        .serialize(serializer)
    }
}

impl<'de> serde::Deserialize<'de> for Curve {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let def = CurveDef::deserialize(deserializer)?;
        let mut curve = Curve::from_points(def.points).map_err(serde::de::Error::custom)?;
        curve.component = def.component;
        curve.pre = def.pre;
        curve.post = def.post;
        Ok(curve)
    }
}

#[cfg(test)]
#[path = "../../tests/unit/animation/curve.rs"]
mod tests;
