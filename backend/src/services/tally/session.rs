//! State machine for one worker's tally of one site.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::bin_key::BinKey;
use super::inspection::{BinInspection, InspectionInput, MissingBinReport, WorkerInfo};
use super::reconcile::{confirmation, ConfirmationView};
use super::site::{BinInstance, Site};
use super::TallyError;

/// Where the worker currently is in the tally.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "step", rename_all = "snake_case")]
pub enum TallyStep {
    IdentifyingWorker,
    SelectingBin,
    InspectingBin { bin: BinKey },
    Confirming,
    Submitted { submitted_at: DateTime<Utc> },
}

/// Result of a back navigation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Back {
    To(TallyStep),
    /// Already on the first step: the caller should leave the tally.
    Leave,
}

/// Progress of a tally: the worker, inspections and missing reports.
///
/// Inspected and missing bins are kept disjoint and each bin key appears at
/// most once across both.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TallySession {
    site: Site,
    step: TallyStep,
    worker: Option<WorkerInfo>,
    inspections: Vec<BinInspection>,
    missing: Vec<MissingBinReport>,
}

impl TallySession {
    pub fn new(site: Site) -> Self {
        Self {
            site,
            step: TallyStep::IdentifyingWorker,
            worker: None,
            inspections: Vec::new(),
            missing: Vec::new(),
        }
    }

    pub fn site(&self) -> &Site {
        &self.site
    }

    pub fn step(&self) -> &TallyStep {
        &self.step
    }

    pub fn worker(&self) -> Option<&WorkerInfo> {
        self.worker.as_ref()
    }

    pub fn inspections(&self) -> &[BinInspection] {
        &self.inspections
    }

    pub fn missing_reports(&self) -> &[MissingBinReport] {
        &self.missing
    }

    pub fn is_submitted(&self) -> bool {
        matches!(self.step, TallyStep::Submitted { .. })
    }

    pub fn inspection(&self, key: &BinKey) -> Option<&BinInspection> {
        self.inspections.iter().find(|i| &i.key() == key)
    }

    pub fn missing_report(&self, key: &BinKey) -> Option<&MissingBinReport> {
        self.missing.iter().find(|r| &r.bin_id == key)
    }

    pub fn is_inspected(&self, key: &BinKey) -> bool {
        self.inspection(key).is_some()
    }

    pub fn is_missing(&self, key: &BinKey) -> bool {
        self.missing_report(key).is_some()
    }

    /// Bins neither inspected nor reported missing, in site order.
    pub fn unaccounted_bins(&self) -> impl Iterator<Item = &BinInstance> + '_ {
        self.site
            .bins
            .iter()
            .filter(move |b| !self.is_inspected(&b.key) && !self.is_missing(&b.key))
    }

    pub fn total_bins(&self) -> usize {
        self.site.total_bins()
    }

    pub fn accounted_for(&self) -> usize {
        self.inspections.len() + self.missing.len()
    }

    pub fn all_accounted_for(&self) -> bool {
        self.accounted_for() >= self.total_bins()
    }

    /// `"X of N bins accounted for"`.
    pub fn progress_label(&self) -> String {
        format!(
            "{} of {} bins accounted for",
            self.accounted_for(),
            self.total_bins()
        )
    }

    fn ensure_open(&self) -> Result<(), TallyError> {
        if self.is_submitted() {
            Err(TallyError::AlreadySubmitted)
        } else {
            Ok(())
        }
    }

    fn ensure_identified(&self) -> Result<(), TallyError> {
        self.ensure_open()?;
        if self.worker.is_none() {
            return Err(TallyError::WorkerNotIdentified);
        }
        Ok(())
    }

    fn site_bin(&self, key: &BinKey) -> Result<BinInstance, TallyError> {
        self.site
            .bin(key)
            .cloned()
            .ok_or_else(|| TallyError::UnknownBin(key.to_string()))
    }

    /// After an inspection or missing report: confirm once every bin is
    /// accounted for, otherwise go back to the bin list.
    fn settle(&mut self) {
        self.step = if self.all_accounted_for() {
            TallyStep::Confirming
        } else {
            TallyStep::SelectingBin
        };
    }

    /// Records who is running the tally. Editing later keeps the current step.
    pub fn identify_worker(&mut self, worker: WorkerInfo) -> Result<&TallyStep, TallyError> {
        self.ensure_open()?;
        self.worker = Some(worker);
        if self.step == TallyStep::IdentifyingWorker {
            self.step = TallyStep::SelectingBin;
        }
        Ok(&self.step)
    }

    pub fn select_bin(&mut self, key: &BinKey) -> Result<&TallyStep, TallyError> {
        self.ensure_identified()?;
        self.site_bin(key)?;
        self.step = TallyStep::InspectingBin { bin: key.clone() };
        Ok(&self.step)
    }

    pub fn cancel_selection(&mut self) -> Result<&TallyStep, TallyError> {
        self.ensure_identified()?;
        self.step = TallyStep::SelectingBin;
        Ok(&self.step)
    }

    /// Upserts the inspection of `key` and clears any missing report for it.
    pub fn record_inspection(
        &mut self,
        key: &BinKey,
        input: &InspectionInput,
        now: DateTime<Utc>,
    ) -> Result<&TallyStep, TallyError> {
        self.ensure_identified()?;
        let bin = self.site_bin(key)?;
        let inspection = BinInspection::observed(&bin, input, now);

        match self.inspections.iter_mut().find(|i| &i.key() == key) {
            Some(existing) => *existing = inspection,
            None => self.inspections.push(inspection),
        }
        self.missing.retain(|r| &r.bin_id != key);

        self.settle();
        Ok(&self.step)
    }

    /// Marks every bin in `keys` missing with the same comment.
    ///
    /// Re-reporting a bin replaces its comment; an earlier inspection of the
    /// bin is dropped. Nothing changes if any key is invalid.
    pub fn report_missing(
        &mut self,
        keys: &[BinKey],
        comment: &str,
        now: DateTime<Utc>,
    ) -> Result<&TallyStep, TallyError> {
        self.ensure_identified()?;
        if keys.is_empty() {
            return Err(TallyError::NoBinsSelected);
        }
        let comment = comment.trim();
        if comment.is_empty() {
            return Err(TallyError::MissingComment);
        }
        let bins = keys
            .iter()
            .map(|k| self.site_bin(k))
            .collect::<Result<Vec<_>, _>>()?;

        for bin in bins {
            let report = MissingBinReport::new(&bin, comment, now);
            match self.missing.iter_mut().find(|r| r.bin_id == bin.key) {
                Some(existing) => *existing = report,
                None => self.missing.push(report),
            }
            self.inspections.retain(|i| i.key() != bin.key);
        }

        self.settle();
        Ok(&self.step)
    }

    /// Moves to confirmation and returns what will be submitted.
    pub fn review(&mut self) -> Result<ConfirmationView, TallyError> {
        self.ensure_identified()?;
        self.step = TallyStep::Confirming;
        Ok(confirmation(self))
    }

    pub fn go_back(&mut self) -> Result<Back, TallyError> {
        self.ensure_open()?;
        let previous = match self.step {
            TallyStep::InspectingBin { .. } | TallyStep::Confirming => TallyStep::SelectingBin,
            TallyStep::SelectingBin => TallyStep::IdentifyingWorker,
            TallyStep::IdentifyingWorker => return Ok(Back::Leave),
            TallyStep::Submitted { .. } => return Err(TallyError::AlreadySubmitted),
        };
        self.step = previous.clone();
        Ok(Back::To(previous))
    }

    /// Closes the session. Inspection data is dropped; the worker and site
    /// stay for the thank-you screen.
    pub fn mark_submitted(&mut self, submitted_at: DateTime<Utc>) -> Result<(), TallyError> {
        self.ensure_identified()?;
        self.inspections.clear();
        self.missing.clear();
        self.step = TallyStep::Submitted { submitted_at };
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::super::inspection::{Fullness, WorkerType};
    use super::super::site::fixtures::{bin_type, details};
    use super::*;

    fn session(rows: Vec<(&str, i32)>) -> TallySession {
        let rows = rows
            .into_iter()
            .map(|(name, qty)| (bin_type(name, Some("240"), Some("L")), qty))
            .collect();
        let mut session = TallySession::new(Site::from_details(&details(rows)));
        session
            .identify_worker(WorkerInfo::new("Sam", WorkerType::Cleaner).unwrap())
            .unwrap();
        session
    }

    fn key(session: &TallySession, index: usize) -> BinKey {
        session.site().bins[index].key.clone()
    }

    fn half_full() -> InspectionInput {
        InspectionInput {
            fullness: Fullness::new(50).unwrap(),
            contaminated: false,
            contamination: vec![],
        }
    }

    #[test]
    fn test_bins_require_identified_worker() {
        let site = session(vec![("Glass", 1)]).site().clone();
        let mut fresh = TallySession::new(site);
        let k = key(&fresh, 0);
        assert_eq!(fresh.select_bin(&k), Err(TallyError::WorkerNotIdentified));
    }

    #[test]
    fn test_reinspection_replaces_previous_entry() {
        let mut s = session(vec![("Glass", 2)]);
        let k = key(&s, 0);
        s.record_inspection(&k, &half_full(), Utc::now()).unwrap();
        let full = InspectionInput {
            fullness: Fullness::new(100).unwrap(),
            ..half_full()
        };
        s.record_inspection(&k, &full, Utc::now()).unwrap();
        assert_eq!(s.inspections().len(), 1);
        assert_eq!(s.inspection(&k).unwrap().fullness, Some(Fullness::new(100).unwrap()));
        assert_eq!(s.step(), &TallyStep::SelectingBin);
    }

    #[test]
    fn test_inspecting_missing_bin_clears_report() {
        let mut s = session(vec![("Glass", 2)]);
        let k = key(&s, 0);
        s.report_missing(&[k.clone()], "Stolen", Utc::now()).unwrap();
        assert!(s.is_missing(&k));
        s.record_inspection(&k, &half_full(), Utc::now()).unwrap();
        assert!(!s.is_missing(&k));
        assert!(s.missing_reports().is_empty());
        assert_eq!(s.accounted_for(), 1);
    }

    #[test]
    fn test_reporting_missing_drops_inspection() {
        let mut s = session(vec![("Glass", 2)]);
        let k = key(&s, 1);
        s.record_inspection(&k, &half_full(), Utc::now()).unwrap();
        s.report_missing(&[k.clone()], "Not on site", Utc::now()).unwrap();
        assert!(!s.is_inspected(&k));
        assert_eq!(s.accounted_for(), 1);
    }

    #[test]
    fn test_missing_requires_comment_and_known_bins() {
        let mut s = session(vec![("Glass", 1)]);
        let k = key(&s, 0);
        assert_eq!(
            s.report_missing(&[k.clone()], "   ", Utc::now()),
            Err(TallyError::MissingComment)
        );
        assert_eq!(
            s.report_missing(&[], "gone", Utc::now()),
            Err(TallyError::NoBinsSelected)
        );
        let bogus = BinKey::from("nope");
        assert!(matches!(
            s.report_missing(&[k, bogus], "gone", Utc::now()),
            Err(TallyError::UnknownBin(_))
        ));
        assert!(s.missing_reports().is_empty());
    }

    #[test]
    fn test_last_bin_moves_to_confirmation() {
        let mut s = session(vec![("Glass", 1), ("Organic", 1)]);
        let (a, b) = (key(&s, 0), key(&s, 1));
        s.record_inspection(&a, &half_full(), Utc::now()).unwrap();
        let step = s.report_missing(&[b], "Moved", Utc::now()).unwrap();
        assert_eq!(step, &TallyStep::Confirming);
        assert!(s.all_accounted_for());
        assert_eq!(s.progress_label(), "2 of 2 bins accounted for");
    }

    #[test]
    fn test_back_navigation() {
        let mut s = session(vec![("Glass", 1)]);
        let k = key(&s, 0);
        s.select_bin(&k).unwrap();
        assert_eq!(s.go_back().unwrap(), Back::To(TallyStep::SelectingBin));
        assert_eq!(s.go_back().unwrap(), Back::To(TallyStep::IdentifyingWorker));
        assert_eq!(s.go_back().unwrap(), Back::Leave);
        assert!(s.worker().is_some());
    }

    #[test]
    fn test_submitted_session_is_closed() {
        let mut s = session(vec![("Glass", 1)]);
        let k = key(&s, 0);
        s.mark_submitted(Utc::now()).unwrap();
        assert!(s.is_submitted());
        assert_eq!(
            s.record_inspection(&k, &half_full(), Utc::now()),
            Err(TallyError::AlreadySubmitted)
        );
    }
}
