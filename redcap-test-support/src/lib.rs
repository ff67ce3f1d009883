//! Shared test utilities used across redcap crates.

pub mod tracing {
    //! Recording layer utilities for capturing spans and events in tests.
    use std::collections::HashMap;
    use std::fmt;
    use std::sync::{Arc, Mutex, MutexGuard};

    use tracing::field::{Field, Visit};
    use tracing::{Event, Level, Subscriber};
    use tracing_subscriber::Layer;
    use tracing_subscriber::layer::Context;
    use tracing_subscriber::registry::LookupSpan;

    /// Layer that keeps every closed span and emitted event so tests can
    /// assert on engine instrumentation.
    ///
    /// # Examples
    /// ```
    /// use redcap_test_support::tracing::RecordingLayer;
    /// use tracing_subscriber::layer::SubscriberExt;
    ///
    /// let layer = RecordingLayer::default();
    /// let subscriber = tracing_subscriber::registry().with(layer.clone());
    /// tracing::subscriber::with_default(subscriber, || {
    ///     let span = tracing::info_span!("core.run", regions = 3_u64);
    ///     let _guard = span.enter();
    ///     tracing::warn!(produced = 2_u64, "short");
    /// });
    /// let span = layer.span("core.run").expect("span closed");
    /// assert_eq!(span.fields["regions"], "3");
    /// assert_eq!(layer.events_at(tracing::Level::WARN).len(), 1);
    /// ```
    #[derive(Clone, Default)]
    pub struct RecordingLayer {
        spans: Arc<Mutex<Vec<SpanRecord>>>,
        events: Arc<Mutex<Vec<EventRecord>>>,
    }

    impl RecordingLayer {
        /// Closed spans in completion order.
        #[must_use]
        pub fn spans(&self) -> Vec<SpanRecord> {
            locked(&self.spans).clone()
        }

        /// Events in emission order.
        #[must_use]
        pub fn events(&self) -> Vec<EventRecord> {
            locked(&self.events).clone()
        }

        /// First closed span called `name`.
        #[must_use]
        pub fn span(&self, name: &str) -> Option<SpanRecord> {
            locked(&self.spans)
                .iter()
                .find(|span| span.name == name)
                .cloned()
        }

        /// Number of closed spans called `name`.
        #[must_use]
        pub fn span_count(&self, name: &str) -> usize {
            locked(&self.spans)
                .iter()
                .filter(|span| span.name == name)
                .count()
        }

        /// Events recorded at exactly `level`.
        #[must_use]
        pub fn events_at(&self, level: Level) -> Vec<EventRecord> {
            locked(&self.events)
                .iter()
                .filter(|event| event.level == level)
                .cloned()
                .collect()
        }
    }

    fn locked<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
        mutex
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
    }

    /// A closed span with its recorded fields.
    #[derive(Debug, Clone, PartialEq, Eq)]
    pub struct SpanRecord {
        /// Span name from the metadata.
        pub name: String,
        /// Fields recorded at creation or later via `Span::record`.
        pub fields: HashMap<String, String>,
    }

    /// An emitted event with its level, target and fields. The event message
    /// is stored under the `message` key.
    #[derive(Debug, Clone, PartialEq, Eq)]
    pub struct EventRecord {
        /// Event level.
        pub level: Level,
        /// Module path or explicit target.
        pub target: String,
        /// Structured fields attached to the event.
        pub fields: HashMap<String, String>,
    }

    impl EventRecord {
        /// The event message, if one was given.
        #[must_use]
        pub fn message(&self) -> Option<&str> {
            self.fields.get("message").map(String::as_str)
        }
    }

    #[derive(Default)]
    struct SpanData {
        name: String,
        fields: HashMap<String, String>,
    }

    impl<S> Layer<S> for RecordingLayer
    where
        S: Subscriber + for<'span> LookupSpan<'span>,
    {
        fn on_new_span(
            &self,
            attrs: &tracing::span::Attributes<'_>,
            id: &tracing::span::Id,
            ctx: Context<'_, S>,
        ) {
            if let Some(span) = ctx.span(id) {
                let mut data = SpanData {
                    name: attrs.metadata().name().to_owned(),
                    fields: HashMap::new(),
                };
                attrs.record(&mut FieldRecorder {
                    fields: &mut data.fields,
                });
                span.extensions_mut().insert(data);
            }
        }

        fn on_record(
            &self,
            id: &tracing::span::Id,
            values: &tracing::span::Record<'_>,
            ctx: Context<'_, S>,
        ) {
            let Some(span) = ctx.span(id) else {
                return;
            };
            let mut extensions = span.extensions_mut();
            if let Some(data) = extensions.get_mut::<SpanData>() {
                values.record(&mut FieldRecorder {
                    fields: &mut data.fields,
                });
            }
        }

        fn on_close(&self, id: tracing::span::Id, ctx: Context<'_, S>) {
            let Some(span) = ctx.span(&id) else {
                return;
            };
            let Some(data) = span.extensions_mut().remove::<SpanData>() else {
                return;
            };
            locked(&self.spans).push(SpanRecord {
                name: data.name,
                fields: data.fields,
            });
        }

        fn on_event(&self, event: &Event<'_>, _ctx: Context<'_, S>) {
            let mut fields = HashMap::new();
            event.record(&mut FieldRecorder {
                fields: &mut fields,
            });
            locked(&self.events).push(EventRecord {
                level: *event.metadata().level(),
                target: event.metadata().target().to_owned(),
                fields,
            });
        }
    }

    struct FieldRecorder<'a> {
        fields: &'a mut HashMap<String, String>,
    }

    impl FieldRecorder<'_> {
        fn put(&mut self, field: &Field, value: String) {
            self.fields.insert(field.name().to_owned(), value);
        }
    }

    impl Visit for FieldRecorder<'_> {
        fn record_debug(&mut self, field: &Field, value: &dyn fmt::Debug) {
            self.put(field, format!("{value:?}"));
        }

        fn record_str(&mut self, field: &Field, value: &str) {
            self.put(field, value.to_owned());
        }

        fn record_error(&mut self, field: &Field, value: &(dyn std::error::Error + 'static)) {
            self.put(field, value.to_string());
        }

        fn record_bool(&mut self, field: &Field, value: bool) {
            self.put(field, value.to_string());
        }

        fn record_i64(&mut self, field: &Field, value: i64) {
            self.put(field, value.to_string());
        }

        fn record_u64(&mut self, field: &Field, value: u64) {
            self.put(field, value.to_string());
        }

        fn record_f64(&mut self, field: &Field, value: f64) {
            self.put(field, value.to_string());
        }
    }
}

pub mod lattice {
    //! Regular grids with rook or queen contiguity.
    //!
    //! Cells are numbered row-major from zero. Neighbour lists are returned
    //! as plain vectors so callers can feed them to whichever contiguity
    //! constructor they test.

    /// A `rows` x `cols` grid.
    ///
    /// # Examples
    /// ```
    /// use redcap_test_support::lattice::Lattice;
    ///
    /// let grid = Lattice::new(2, 3);
    /// assert_eq!(grid.len(), 6);
    /// assert_eq!(grid.rook()[4], vec![1, 3, 5]);
    /// assert_eq!(grid.queen()[0], vec![1, 3, 4]);
    /// ```
    #[derive(Clone, Copy, Debug, PartialEq, Eq)]
    pub struct Lattice {
        rows: usize,
        cols: usize,
    }

    impl Lattice {
        /// Creates a grid description.
        #[must_use]
        pub const fn new(rows: usize, cols: usize) -> Self {
            Self { rows, cols }
        }

        /// Number of cells.
        #[must_use]
        pub const fn len(&self) -> usize {
            self.rows * self.cols
        }

        /// Returns whether the grid has no cells.
        #[must_use]
        pub const fn is_empty(&self) -> bool {
            self.len() == 0
        }

        /// Row-major id of the cell at (`row`, `col`).
        #[must_use]
        pub const fn id(&self, row: usize, col: usize) -> usize {
            row * self.cols + col
        }

        /// Neighbours sharing an edge, in ascending id order.
        #[must_use]
        pub fn rook(&self) -> Vec<Vec<usize>> {
            self.neighbours(false)
        }

        /// Neighbours sharing an edge or a corner, in ascending id order.
        #[must_use]
        pub fn queen(&self) -> Vec<Vec<usize>> {
            self.neighbours(true)
        }

        /// Undirected rook links `(a, b)` with `a < b`.
        #[must_use]
        pub fn rook_links(&self) -> Vec<(usize, usize)> {
            self.rook()
                .into_iter()
                .enumerate()
                .flat_map(|(a, list)| list.into_iter().filter(move |&b| a < b).map(move |b| (a, b)))
                .collect()
        }

        fn neighbours(&self, diagonal: bool) -> Vec<Vec<usize>> {
            let mut lists = Vec::with_capacity(self.len());
            for row in 0..self.rows {
                for col in 0..self.cols {
                    let mut list = Vec::new();
                    for dr in -1_isize..=1 {
                        for dc in -1_isize..=1 {
                            if (dr, dc) == (0, 0) || (!diagonal && dr != 0 && dc != 0) {
                                continue;
                            }
                            let (Some(r), Some(c)) =
                                (row.checked_add_signed(dr), col.checked_add_signed(dc))
                            else {
                                continue;
                            };
                            if r < self.rows && c < self.cols {
                                list.push(self.id(r, c));
                            }
                        }
                    }
                    lists.push(list);
                }
            }
            lists
        }
    }

}
