use std::collections::HashSet;
use std::sync::Mutex;

use rand::Rng;

/// Browser User-Agents rotated across fetch attempts.
const USER_AGENTS: &[&str] = &[
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/131.0.0.0 Safari/537.36",
    "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/131.0.0.0 Safari/537.36",
    "Mozilla/5.0 (X11; Linux x86_64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/130.0.0.0 Safari/537.36",
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64; rv:133.0) Gecko/20100101 Firefox/133.0",
    "Mozilla/5.0 (Macintosh; Intel Mac OS X 10.15; rv:133.0) Gecko/20100101 Firefox/133.0",
    "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/605.1.15 (KHTML, like Gecko) Version/17.6 Safari/605.1.15",
];

/// The identity a single fetch attempt presents to the remote end.
#[derive(Debug, Clone)]
pub struct Identity {
    pub user_agent: &'static str,
    /// (pool index, proxy url); None when no proxy pool is configured
    /// or every proxy has been marked bad.
    pub proxy: Option<(usize, String)>,
}

#[derive(Debug, Default)]
struct PoolState {
    bad: HashSet<usize>,
    last_ua: Option<usize>,
    last_proxy: Option<usize>,
}

/// Shared identity state for one run: the proxy list and the set of
/// proxies that have failed. Consecutive draws never repeat the previous
/// user-agent, and never repeat the previous proxy while an alternative
/// remains. A proxy marked bad is skipped for the rest of the run.
#[derive(Debug)]
pub struct IdentityPool {
    proxies: Vec<String>,
    state: Mutex<PoolState>,
}

impl IdentityPool {
    pub fn new(proxies: Vec<String>) -> Self {
        Self {
            proxies,
            state: Mutex::new(PoolState::default()),
        }
    }

    /// Draw a fresh identity for the next attempt.
    pub fn draw(&self) -> Identity {
        let mut rng = rand::rng();
        let mut state = self.state.lock().unwrap_or_else(|e| e.into_inner());

        let mut ua_idx = rng.random_range(0..USER_AGENTS.len());
        if USER_AGENTS.len() > 1 && state.last_ua == Some(ua_idx) {
            ua_idx = (ua_idx + 1) % USER_AGENTS.len();
        }
        state.last_ua = Some(ua_idx);

        let good: Vec<usize> = (0..self.proxies.len())
            .filter(|i| !state.bad.contains(i))
            .collect();
        let proxy = if good.is_empty() {
            None
        } else {
            let mut pick = good[rng.random_range(0..good.len())];
            if good.len() > 1 && state.last_proxy == Some(pick) {
                let pos = good.iter().position(|&i| i == pick).unwrap_or(0);
                pick = good[(pos + 1) % good.len()];
            }
            state.last_proxy = Some(pick);
            Some((pick, self.proxies[pick].clone()))
        };

        Identity {
            user_agent: USER_AGENTS[ua_idx],
            proxy,
        }
    }

    /// Exclude a proxy from all subsequent draws in this run.
    pub fn mark_bad(&self, index: usize) {
        let mut state = self.state.lock().unwrap_or_else(|e| e.into_inner());
        if index < self.proxies.len() && state.bad.insert(index) {
            tracing::warn!(
                "Proxy {} marked bad ({} of {} remaining)",
                self.proxies[index],
                self.proxies.len() - state.bad.len(),
                self.proxies.len()
            );
        }
    }

    pub fn good_proxies(&self) -> usize {
        let state = self.state.lock().unwrap_or_else(|e| e.into_inner());
        self.proxies.len() - state.bad.len()
    }
}

impl Default for IdentityPool {
    fn default() -> Self {
        Self::new(Vec::new())
    }
}
