use crate::animation::curve::Curve;
use crate::foundation::error::{CurveError, CurveResult};

/// A named multi-component animated value, one [`Curve`] per scalar component.
///
/// Curves are kept ordered by [`Curve::component`] and component indices are unique, so
/// [`Channel::sample`] yields components in index order (X, Y, Z for a vector).
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Channel {
    name: String,
    curves: Vec<Curve>,
}

impl Channel {
    /// Channel with `components` empty curves numbered `0..components`.
    pub fn new(name: impl Into<String>, components: u32) -> Self {
        Self {
            name: name.into(),
            curves: (0..components).map(Curve::with_component).collect(),
        }
    }

    /// Channel from existing curves in any order. Duplicate component indices are rejected.
    pub fn from_curves(name: impl Into<String>, mut curves: Vec<Curve>) -> CurveResult<Self> {
        curves.sort_by_key(Curve::component);
        if let Some(dup) = curves
            .windows(2)
            .find(|w| w[0].component() == w[1].component())
        {
            return Err(CurveError::invalid_value(format!(
                "channel has two curves for component {}",
                dup[0].component()
            )));
        }
        Ok(Self {
            name: name.into(),
            curves,
        })
    }

    /// Channel name, e.g. the animated input it drives.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Number of components.
    pub fn components(&self) -> usize {
        self.curves.len()
    }

    /// All curves in component order.
    pub fn curves(&self) -> &[Curve] {
        &self.curves
    }

    /// Curve animating `component`.
    pub fn curve(&self, component: u32) -> Option<&Curve> {
        self.curves.iter().find(|c| c.component() == component)
    }

    /// Edit the curve animating `component`, returning `None` when the channel has no such
    /// component.
    ///
    /// The component index is owned by the channel: a `set_component` call made inside `edit` is
    /// reverted once it returns.
    pub fn edit_curve<R>(
        &mut self,
        component: u32,
        edit: impl FnOnce(&mut Curve) -> R,
    ) -> Option<R> {
        let curve = self.curves.iter_mut().find(|c| c.component() == component)?;
        let out = edit(curve);
        if curve.component() != component {
            tracing::warn!(component, "channel component index changed inside edit; reverted");
            curve.set_component(component);
        }
        Some(out)
    }

    /// Sample every component at `u`.
    pub fn sample(&self, u: f64) -> CurveResult<Vec<f64>> {
        let mut out = Vec::with_capacity(self.curves.len());
        self.sample_into(u, &mut out)?;
        Ok(out)
    }

    /// Sample every component at `u` into `out`, replacing its contents.
    pub fn sample_into(&self, u: f64, out: &mut Vec<f64>) -> CurveResult<()> {
        out.clear();
        for curve in &self.curves {
            out.push(curve.sample(u)?);
        }
        Ok(())
    }

    /// Parse a channel from a JSON reader.
    pub fn from_reader<R: std::io::Read>(r: R) -> CurveResult<Self> {
        serde_json::from_reader(r)
            .map_err(|e| CurveError::serde(format!("parse channel JSON: {e}")))
    }

    /// Serialize to pretty-printed JSON.
    pub fn to_json_string(&self) -> CurveResult<String> {
        serde_json::to_string_pretty(self)
            .map_err(|e| CurveError::serde(format!("write channel JSON: {e}")))
    }
}

// ----------------------------
// Boundary (serde) structures
// ----------------------------

#[derive(serde::Serialize)]
struct ChannelDefRef<'a> {
    name: &'a str,
    curves: &'a [Curve],
}

#[derive(serde::Deserialize)]
struct ChannelDef {
    #[serde(default)]
    name: String,
    #[serde(default)]
    curves: Vec<Curve>,
}

impl serde::Serialize for Channel {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        ChannelDefRef {
            name: &self.name,
            curves: &self.curves,
        }
        .serialize(serializer)
    }
}

impl<'de> serde::Deserialize<'de> for Channel {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let def = ChannelDef::deserialize(deserializer)?;
        Channel::from_curves(def.name, def.curves).map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
#[path = "../../tests/unit/eval/channel.rs"]
mod tests;
