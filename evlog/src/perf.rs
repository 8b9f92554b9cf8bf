use std::{sync::{RwLock, Arc}, collections::HashMap, time::{Duration, Instant}, fmt::Display};

use serde::Serialize;

/// Замеры длительности именованных операций
#[derive(Debug, Clone, Default)]
pub struct Tracker {
  tracks: Arc<RwLock<HashMap<String,(u64, Duration)>>>
}

/// Сводка по одной операции
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TrackStat {
  pub name: String,
  pub count: u64,
  pub total: Duration,
  pub avg: Duration,
}

impl Tracker {
  pub fn new() -> Self {
    Self {
      tracks: Arc::new(RwLock::new(HashMap::new()))
    }
  }

  /// Выполняет `tracked` и учитывает время выполнения под именем `name`
  pub fn track<F,R>( &self, name:&str, tracked:F ) -> R
  where F: FnOnce() -> R
  {
    let t0 = Instant::now();
    let res = tracked();
    self.add(name, t0.elapsed());
    res
  }

  pub fn add( &self, name:&str, dur:Duration ) {
    if let Ok(mut tracks) = self.tracks.write() {
      let entry = tracks.entry(name.to_string()).or_insert((0, Duration::ZERO));
      entry.0 += 1;
      entry.1 += dur;
    }
  }

  /// Снимок замеров, упорядоченный по имени
  pub fn snapshot( &self ) -> Vec<TrackStat> {
    let mut stats: Vec<TrackStat> = match self.tracks.read() {
      Err(_) => vec![],
      Ok(tracks) => tracks.iter().map(|(name,(cnt,dur))| {
        TrackStat {
          name: name.clone(),
          count: *cnt,
          total: *dur,
          avg: if *cnt > 0 { *dur / (*cnt as u32).max(1) } else { Duration::ZERO },
        }
      }).collect()
    };
    stats.sort_by(|a,b| a.name.cmp(&b.name));
    stats
  }
}

impl Display for Tracker {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    writeln!(f, "tracks:")?;
    for stat in self.snapshot() {
      writeln!(f, "{} cnt={} dur.sum={:?} dur.avg={:?}", stat.name, stat.count, stat.total, stat.avg)?;
    }
    Ok(())
  }
}

#[test]
fn tracker_counts() {
  let t = Tracker::new();
  let v = t.track("a", || 2 + 2);
  t.track("a", || ());
  t.add("b", Duration::from_millis(5));
  assert_eq!(v, 4);

  let snap = t.snapshot();
  assert_eq!(snap.len(), 2);
  assert_eq!(snap[0].name, "a");
  assert_eq!(snap[0].count, 2);
  assert_eq!(snap[1].total, Duration::from_millis(5));
  assert!(format!("{t}").contains("b cnt=1"));
}
