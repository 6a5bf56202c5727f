use std::collections::BTreeMap;

/// Immutable mapping from parameter name to display label.
///
/// Built once and handed to whatever renders labels; nothing mutates it after
/// construction.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct LabelTable {
    labels: BTreeMap<String, String>,
}

impl LabelTable {
    /// Builds a table from `(name, label)` pairs.
    pub fn new<I, K, V>(entries: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        Self {
            labels: entries
                .into_iter()
                .map(|(name, label)| (name.into(), label.into()))
                .collect(),
        }
    }

    /// Labels for compact-binary coalescence parameters.
    pub fn gravitational_wave() -> Self {
        Self::new([
            ("mass_1", "$m_1$"),
            ("mass_2", "$m_2$"),
            ("total_mass", "$M$"),
            ("chirp_mass", "$\\mathcal{M}$"),
            ("mass_ratio", "$q$"),
            ("symmetric_mass_ratio", "$\\eta$"),
            ("a_1", "$a_1$"),
            ("a_2", "$a_2$"),
            ("tilt_1", "$\\theta_1$"),
            ("tilt_2", "$\\theta_2$"),
            ("cos_tilt_1", "$\\cos\\theta_1$"),
            ("cos_tilt_2", "$\\cos\\theta_2$"),
            ("phi_12", "$\\Delta\\phi$"),
            ("phi_jl", "$\\phi_{JL}$"),
            ("luminosity_distance", "$d_L$"),
            ("dec", "$\\mathrm{DEC}$"),
            ("ra", "$\\mathrm{RA}$"),
            ("iota", "$\\iota$"),
            ("cos_iota", "$\\cos\\iota$"),
            ("psi", "$\\psi$"),
            ("phase", "$\\phi$"),
            ("geocent_time", "$t_c$"),
            ("lambda_1", "$\\Lambda_1$"),
            ("lambda_2", "$\\Lambda_2$"),
            ("lambda_tilde", "$\\tilde{\\Lambda}$"),
            ("delta_lambda", "$\\delta\\Lambda$"),
        ])
    }

    /// Label registered for `name`.
    pub fn get(&self, name: &str) -> Option<&str> {
        self.labels.get(name).map(String::as_str)
    }

    /// Label for `name`, falling back to the name itself.
    pub fn label_or_name<'a>(&'a self, name: &'a str) -> &'a str {
        self.get(name).unwrap_or(name)
    }
}
