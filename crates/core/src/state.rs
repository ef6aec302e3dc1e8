//! Step Analyses State
//!
//! The authoritative snapshot for one viewed step: every open panel, the tab
//! order and the focused tab. Mutated only by `reducer::reduce`.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::panel::Panel;
use crate::types::{AnalysisChoice, PanelId, StepId, StrategyId};

/// Number of countdown ticks between two status checks.
pub const DEFAULT_POLL_BUDGET: u32 = 3;

/// Orchestrator state for the step currently being viewed
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct StepAnalysesState {
    pub step_id: StepId,
    pub strategy_id: StrategyId,
    /// Bumped on every tab-listing reset; follow-up work tagged with an
    /// older generation belongs to a previous step and is discarded.
    pub generation: u64,
    pub analysis_choices: Vec<AnalysisChoice>,
    pub loading_choices: bool,
    pub panel_order: Vec<PanelId>,
    pub panels: BTreeMap<PanelId, Panel>,
    /// `None` when no tab is focused
    pub active_tab: Option<PanelId>,
    pub next_panel_id: PanelId,
    /// Countdown reset value for submissions and polling
    pub poll_budget: u32,
}

impl Default for StepAnalysesState {
    fn default() -> Self {
        Self {
            step_id: 0,
            strategy_id: 0,
            generation: 0,
            analysis_choices: Vec::new(),
            loading_choices: false,
            panel_order: Vec::new(),
            panels: BTreeMap::new(),
            active_tab: None,
            next_panel_id: 0,
            poll_budget: DEFAULT_POLL_BUDGET,
        }
    }
}

impl StepAnalysesState {
    /// A fresh state for `step_id`, one generation after `previous`.
    pub fn reset(previous: &StepAnalysesState, step_id: StepId, strategy_id: StrategyId) -> Self {
        Self {
            step_id,
            strategy_id,
            generation: previous.generation + 1,
            loading_choices: true,
            poll_budget: previous.poll_budget,
            ..Self::default()
        }
    }

    /// Builder: override the poll budget.
    pub fn with_poll_budget(mut self, poll_budget: u32) -> Self {
        self.poll_budget = poll_budget;
        self
    }

    pub fn panel(&self, panel_id: PanelId) -> Option<&Panel> {
        self.panels.get(&panel_id)
    }

    /// Id of the menu tab, if one is open.
    pub fn menu_panel_id(&self) -> Option<PanelId> {
        self.panel_order
            .iter()
            .copied()
            .find(|id| self.panels.get(id).is_some_and(Panel::is_menu))
    }

    /// Panels in tab order.
    pub fn ordered_panels(&self) -> impl Iterator<Item = (PanelId, &Panel)> {
        self.panel_order
            .iter()
            .filter_map(|id| self.panels.get(id).map(|panel| (*id, panel)))
    }

    /// Insert a panel, keeping the menu tab last.
    ///
    /// A second menu panel is refused; returns the new id otherwise.
    pub(crate) fn insert_panel(&mut self, panel: Panel) -> Option<PanelId> {
        let menu_id = self.menu_panel_id();
        if menu_id.is_some() && panel.is_menu() {
            return None;
        }

        let id = self.next_panel_id;
        self.next_panel_id += 1;
        self.panels.insert(id, panel);
        match menu_id {
            Some(menu_id) => {
                let position = self.panel_order.len().saturating_sub(1);
                debug_assert_eq!(self.panel_order.last(), Some(&menu_id));
                self.panel_order.insert(position, id);
            }
            None => self.panel_order.push(id),
        }
        Some(id)
    }

    /// Remove a panel from both the order and the map; returns its former
    /// position and value.
    pub(crate) fn remove_panel(&mut self, panel_id: PanelId) -> Option<(usize, Panel)> {
        let position = self.panel_order.iter().position(|id| *id == panel_id)?;
        self.panel_order.remove(position);
        let panel = self.panels.remove(&panel_id)?;
        Some((position, panel))
    }

    /// Check the structural invariants of the state.
    pub fn check_invariants(&self) -> Result<(), String> {
        if self.panel_order.len() != self.panels.len() {
            return Err(format!(
                "panel order has {} entries but {} panels exist",
                self.panel_order.len(),
                self.panels.len()
            ));
        }
        for id in &self.panel_order {
            if !self.panels.contains_key(id) {
                return Err(format!("panel {} is ordered but missing", id));
            }
        }
        let mut seen = std::collections::BTreeSet::new();
        for id in &self.panel_order {
            if !seen.insert(*id) {
                return Err(format!("panel {} appears twice in the order", id));
            }
        }

        let menus: Vec<PanelId> = self
            .panel_order
            .iter()
            .copied()
            .filter(|id| self.panels[id].is_menu())
            .collect();
        if menus.len() > 1 {
            return Err(format!("{} menu panels are open", menus.len()));
        }
        if let Some(menu_id) = menus.first() {
            if self.panel_order.last() != Some(menu_id) {
                return Err(format!("menu panel {} is not the last tab", menu_id));
            }
        }

        if let Some(active) = self.active_tab {
            if !self.panels.contains_key(&active) {
                return Err(format!("active tab {} does not exist", active));
            }
        }
        Ok(())
    }
}
