//! Process-wide, lazily populated graph cache keyed by city.
//!
//! Graphs are loaded once on first request and never evicted. Each city owns
//! a slot; the map lock is held only to find or insert a slot, never while a
//! graph is being read from disk, so cached cities stay servable while
//! another city loads.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, OnceLock, RwLock};

use crate::error::GraphError;
use crate::graph::NavigationGraph;
use crate::graph::source::GraphSource;

#[derive(Default)]
struct Slot {
    graph: OnceLock<Arc<NavigationGraph>>,
    // serializes first loads of this city only
    loading: Mutex<()>,
}

pub struct GraphCache<S> {
    source: S,
    slots: RwLock<HashMap<String, Arc<Slot>>>,
}

impl<S: GraphSource> GraphCache<S> {
    pub fn new(source: S) -> Self {
        Self {
            source,
            slots: RwLock::new(HashMap::new()),
        }
    }

    /// Returns the cached graph for `city`, loading it on first use.
    /// Concurrent first requests for the same city load it only once; a
    /// failed load leaves nothing cached.
    pub fn load(&self, city: &str) -> Result<Arc<NavigationGraph>, GraphError> {
        let slot = self.slot(city);
        if let Some(graph) = slot.graph.get() {
            return Ok(Arc::clone(graph));
        }

        let _loading = slot.loading.lock().unwrap_or_else(|e| e.into_inner());
        // another request may have finished loading while we waited
        if let Some(graph) = slot.graph.get() {
            return Ok(Arc::clone(graph));
        }

        match self.source.load(city) {
            Ok(graph) => {
                let graph = Arc::clone(slot.graph.get_or_init(|| Arc::new(graph)));
                tracing::info!(
                    city,
                    nodes = graph.node_count(),
                    edges = graph.edge_count(),
                    "cached graph"
                );
                // a failed load before ours may have dropped the slot
                let mut slots = self.slots.write().unwrap_or_else(|e| e.into_inner());
                slots.entry(city.to_string()).or_insert_with(|| Arc::clone(&slot));
                Ok(graph)
            }
            Err(err) => {
                let mut slots = self.slots.write().unwrap_or_else(|e| e.into_inner());
                if slots
                    .get(city)
                    .is_some_and(|current| Arc::ptr_eq(current, &slot) && current.graph.get().is_none())
                {
                    slots.remove(city);
                }
                Err(err)
            }
        }
    }

    fn slot(&self, city: &str) -> Arc<Slot> {
        {
            let slots = self.slots.read().unwrap_or_else(|e| e.into_inner());
            if let Some(slot) = slots.get(city) {
                return Arc::clone(slot);
            }
        }
        let mut slots = self.slots.write().unwrap_or_else(|e| e.into_inner());
        Arc::clone(slots.entry(city.to_string()).or_default())
    }

    /// Cities the underlying source can serve.
    pub fn cities(&self) -> Vec<String> {
        self.source.cities()
    }

    #[cfg(test)]
    fn cached_cities(&self) -> Vec<String> {
        let slots = self.slots.read().unwrap_or_else(|e| e.into_inner());
        let mut keys: Vec<String> = slots
            .iter()
            .filter(|(_, slot)| slot.graph.get().is_some())
            .map(|(city, _)| city.clone())
            .collect();
        keys.sort();
        keys
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::{GeoNode, RoadEdge};
    use petgraph::graph::Graph;
    use std::sync::Barrier;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::{Duration, Instant};

    fn small_graph() -> NavigationGraph {
        let mut g = Graph::new();
        let a = g.add_node(GeoNode { lat: 12.29, lon: 76.63 });
        let b = g.add_node(GeoNode { lat: 12.30, lon: 76.64 });
        g.add_edge(a, b, RoadEdge::new(150.0, None));
        NavigationGraph::new(g)
    }

    #[derive(Default)]
    struct CountingSource {
        loads: AtomicUsize,
    }

    impl GraphSource for CountingSource {
        fn load(&self, city: &str) -> Result<NavigationGraph, GraphError> {
            if city != "mysuru" {
                return Err(GraphError::NotFound { city: city.to_string() });
            }
            self.loads.fetch_add(1, Ordering::SeqCst);
            Ok(small_graph())
        }

        fn cities(&self) -> Vec<String> {
            vec!["mysuru".to_string()]
        }
    }

    #[test]
    fn second_load_returns_cached_instance() {
        let cache = GraphCache::new(CountingSource::default());
        let first = cache.load("mysuru").unwrap();
        let second = cache.load("mysuru").unwrap();
        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(cache.source.loads.load(Ordering::SeqCst), 1);
        assert_eq!(cache.cached_cities(), vec!["mysuru"]);
    }

    #[test]
    fn concurrent_first_loads_hit_source_once() {
        let cache = Arc::new(GraphCache::new(CountingSource::default()));
        let handles: Vec<_> = (0..8)
            .map(|_| {
                let cache = Arc::clone(&cache);
                std::thread::spawn(move || cache.load("mysuru").unwrap())
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }
        assert_eq!(cache.source.loads.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn unknown_city_is_not_cached() {
        let cache = GraphCache::new(CountingSource::default());
        assert!(matches!(
            cache.load("hosur"),
            Err(GraphError::NotFound { .. })
        ));
        assert!(cache.cached_cities().is_empty());
    }

    /// Serves "fast" at once; "slow" signals the barrier, then takes a while.
    struct SlowSource {
        started: Barrier,
    }

    impl GraphSource for SlowSource {
        fn load(&self, city: &str) -> Result<NavigationGraph, GraphError> {
            if city == "slow" {
                self.started.wait();
                std::thread::sleep(Duration::from_millis(1500));
            }
            Ok(small_graph())
        }

        fn cities(&self) -> Vec<String> {
            vec!["fast".to_string(), "slow".to_string()]
        }
    }

    #[test]
    fn cached_city_is_served_while_another_city_loads() {
        let cache = Arc::new(GraphCache::new(SlowSource { started: Barrier::new(2) }));
        let fast = cache.load("fast").unwrap();

        let slow = {
            let cache = Arc::clone(&cache);
            std::thread::spawn(move || cache.load("slow").unwrap())
        };
        cache.source.started.wait();

        let begin = Instant::now();
        let again = cache.load("fast").unwrap();
        let waited = begin.elapsed();

        assert!(Arc::ptr_eq(&fast, &again));
        assert!(waited < Duration::from_millis(200), "cached read waited {waited:?}");
        slow.join().unwrap();
        assert_eq!(cache.cached_cities(), vec!["fast", "slow"]);
    }

    #[test]
    fn failed_load_can_be_retried() {
        let cache = GraphCache::new(CountingSource::default());
        assert!(cache.load("hosur").is_err());
        assert!(cache.load("hosur").is_err());
        assert!(cache.load("mysuru").is_ok());
        assert_eq!(cache.cached_cities(), vec!["mysuru"]);
    }
}
