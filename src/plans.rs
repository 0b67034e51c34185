use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::store::{DualStore, StoreName};

/// Preventive plan assigned to an employee after a certificate review.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PreventivePlan {
    #[serde(default)]
    pub actions: Vec<String>,
    #[serde(default)]
    pub follow_ups: Vec<String>,
    #[serde(default)]
    pub recommendations: Vec<String>,
}

impl PreventivePlan {
    pub fn is_empty(&self) -> bool {
        self.actions.is_empty() && self.follow_ups.is_empty() && self.recommendations.is_empty()
    }
}

pub type PlanMap = BTreeMap<String, PreventivePlan>;

pub fn all_plans(store: &DualStore) -> PlanMap {
    store.read(StoreName::Plans)
}

pub fn employee_plan(store: &DualStore, employee_key: &str) -> Option<PreventivePlan> {
    if employee_key.is_empty() {
        return None;
    }
    all_plans(store).remove(employee_key)
}

/// Upsert an employee's plan. Saving an empty plan removes the entry.
pub fn save_plan(store: &DualStore, employee_key: &str, plan: PreventivePlan) {
    if employee_key.is_empty() {
        return;
    }
    let mut plans: PlanMap = store.read_local(StoreName::Plans);
    if plan.is_empty() {
        plans.remove(employee_key);
    } else {
        plans.insert(employee_key.to_string(), plan);
    }
    store.write(StoreName::Plans, &plans);
}
