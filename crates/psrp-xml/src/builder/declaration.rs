use std::borrow::Cow;

/// The `<?xml ... ?>` prologue.
#[derive(Debug, Clone)]
pub struct Declaration<'a> {
    version: Cow<'a, str>,
    encoding: Cow<'a, str>,
    standalone: Option<bool>,
}

impl<'a> Declaration<'a> {
    pub fn new(version: impl Into<Cow<'a, str>>, encoding: impl Into<Cow<'a, str>>) -> Self {
        Self {
            version: version.into(),
            encoding: encoding.into(),
            standalone: None,
        }
    }

    #[must_use]
    pub fn with_standalone(mut self, standalone: bool) -> Self {
        self.standalone = Some(standalone);
        self
    }
}

impl std::fmt::Display for Declaration<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "<?xml version=\"{}\" encoding=\"{}\"",
            self.version, self.encoding
        )?;
        if let Some(standalone) = self.standalone {
            write!(f, " standalone=\"{}\"", if standalone { "yes" } else { "no" })?;
        }
        write!(f, "?>")
    }
}
