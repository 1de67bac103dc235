//! Screen routing as a back stack.

use tracing::debug;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Route {
  Home,
  Search,
  Watch(String),
  Discover,
  MyList,
}

impl Route {
  pub fn title(&self) -> &'static str {
    match self {
      Route::Home => "Home",
      Route::Search => "Search",
      Route::Watch(_) => "Watch",
      Route::Discover => "Discover",
      Route::MyList => "My List",
    }
  }
}

#[derive(Debug, Clone)]
pub struct Navigator {
  stack: Vec<Route>,
}

impl Navigator {
  pub fn new(root: Route) -> Self {
    Self { stack: vec![root] }
  }

  pub fn current(&self) -> &Route {
    // The root is never popped.
    &self.stack[self.stack.len() - 1]
  }

  pub fn depth(&self) -> usize {
    self.stack.len()
  }

  /// Push `route` unless it is already the current one.
  pub fn go_to(&mut self, route: Route) {
    if *self.current() == route {
      return;
    }
    debug!(from = ?self.current(), to = ?route, "nav: go_to");
    self.stack.push(route);
  }

  /// Pop back one screen. Returns `false` at the root.
  pub fn go_back(&mut self) -> bool {
    if self.stack.len() <= 1 {
      return false;
    }
    self.stack.pop();
    debug!(to = ?self.current(), "nav: back");
    true
  }
}

impl Default for Navigator {
  fn default() -> Self {
    Self::new(Route::Home)
  }
}
