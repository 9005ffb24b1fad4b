use std::fmt;

/// Controls how an event is formatted.
#[derive(Debug, Default, Clone, Copy)]
pub struct DisplayFormat {
    /// Can the formatting logic use more than a single line?
    pub multiline: bool,
}

impl DisplayFormat {
    pub fn new() -> Self {
        Self::default()
    }

    /// Configure multi-line output.
    pub fn multiline(mut self, enabled: bool) -> Self {
        self.multiline = enabled;
        self
    }
}

/// Trait controlling how an event (or any custom type inside it) is
/// displayed. It provides an helper returning an implementation of
/// std::fmt::Display, which unlike a plain Display implementation can take
/// the requested format as an argument.
pub trait EventDisplay<'a>: EventFmt {
    /// Display the event using the given format.
    fn display(&'a self, format: DisplayFormat) -> Box<dyn fmt::Display + 'a>;
}

/// Trait controlling how an event (or any custom type inside it) is
/// formatted. All types implementing it get EventDisplay for free.
pub trait EventFmt {
    fn event_fmt(&self, f: &mut fmt::Formatter, format: &DisplayFormat) -> fmt::Result;
}

impl<'a, T> EventDisplay<'a> for T
where
    T: EventFmt,
{
    fn display(&'a self, format: DisplayFormat) -> Box<dyn fmt::Display + 'a> {
        struct DefaultDisplay<'a, U> {
            myself: &'a U,
            format: DisplayFormat,
        }
        impl<U: EventFmt> fmt::Display for DefaultDisplay<'_, U> {
            fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
                self.myself.event_fmt(f, &self.format)
            }
        }
        Box::new(DefaultDisplay {
            myself: self,
            format,
        })
    }
}

/// DelimWriter prints a delimiter (e.g. ',' or ' ') only if it's not the
/// first time write() is called. This helps print lists of items.
pub struct DelimWriter {
    delim: &'static str,
    first: bool,
}

impl DelimWriter {
    pub fn new(delim: &'static str) -> Self {
        DelimWriter { delim, first: true }
    }

    /// If it's not the first time it's called, write the delimiter.
    pub fn write(&mut self, f: &mut fmt::Formatter) -> fmt::Result {
        match self.first {
            true => self.first = false,
            false => write!(f, "{}", self.delim)?,
        }
        Ok(())
    }
}
