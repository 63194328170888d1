use log::{debug, info};

use super::MemoryHost;
use crate::error::{RangekitError, Result};
use crate::host::{
    EditToken, HostDocument, NamedRangeRecord, SavePayload, Scope, SelectionSnapshot, name_key,
};

impl MemoryHost {
    fn check_payload(&self, payload: &SavePayload) -> Result<()> {
        if let Scope::Sheet(sheet) = &payload.scope {
            if !self.has_sheet(sheet) {
                return Err(RangekitError::UnknownSheet(sheet.clone()));
            }
        }
        Ok(())
    }
}

impl HostDocument for MemoryHost {
    fn selection(&self) -> Result<SelectionSnapshot> {
        self.selection.clone().ok_or(RangekitError::NoSelection)
    }

    fn sheets(&self) -> Result<Vec<String>> {
        Ok(self.sheets.clone())
    }

    fn names(&self) -> Result<Vec<NamedRangeRecord>> {
        let mut records: Vec<NamedRangeRecord> = self
            .names
            .iter()
            .map(|entry| {
                let payload = entry.value();
                let (resolved_address, resolved_value) = self.resolve(&payload.formula);
                NamedRangeRecord {
                    name: payload.name.clone(),
                    formula: payload.formula.clone(),
                    comment: payload.comment.clone(),
                    resolved_address,
                    resolved_value,
                    scope: payload.scope.clone(),
                }
            })
            .collect();
        records.sort_by_key(|record| name_key(&record.name));
        Ok(records)
    }

    fn create(&mut self, payload: &SavePayload) -> Result<()> {
        self.check_payload(payload)?;
        if self.contains(&payload.name) {
            return Err(RangekitError::NameExists(payload.name.clone()));
        }
        self.names.insert(name_key(&payload.name), payload.clone());
        self.modified = true;
        info!("created name {}", payload.name);
        Ok(())
    }

    fn update(&mut self, original_name: &str, payload: &SavePayload) -> Result<()> {
        self.check_payload(payload)?;
        let old_key = name_key(original_name);
        let new_key = name_key(&payload.name);
        if !self.names.contains_key(&old_key) {
            return Err(RangekitError::NameNotFound(original_name.to_string()));
        }
        if new_key != old_key && self.names.contains_key(&new_key) {
            return Err(RangekitError::NameExists(payload.name.clone()));
        }
        self.names.remove(&old_key);
        self.names.insert(new_key, payload.clone());
        self.modified = true;
        debug!("updated name {} as {}", original_name, payload.name);
        Ok(())
    }

    fn delete(&mut self, name: &str) -> Result<()> {
        if self.names.remove(&name_key(name)).is_none() {
            return Err(RangekitError::NameNotFound(name.to_string()));
        }
        self.modified = true;
        info!("deleted name {}", name);
        Ok(())
    }

    fn begin_edit(&self, name: &str) -> Result<EditToken> {
        self.edits.begin(name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn payload(name: &str, formula: &str) -> SavePayload {
        SavePayload {
            name: name.into(),
            formula: formula.into(),
            comment: String::new(),
            scope: Scope::Document,
        }
    }

    #[test]
    fn test_create_rejects_duplicates_case_insensitively() {
        let mut host = MemoryHost::with_sheets(["Sheet1"]);
        host.create(&payload("Revenue", "=Sheet1!$A$1")).unwrap();
        assert!(host.modified);
        assert!(matches!(
            host.create(&payload("REVENUE", "=Sheet1!$B$1")),
            Err(RangekitError::NameExists(_))
        ));
    }

    #[test]
    fn test_create_rejects_unknown_scope_sheet() {
        let mut host = MemoryHost::with_sheets(["Sheet1"]);
        let mut local = payload("Local", "=Sheet1!$A$1");
        local.scope = Scope::Sheet("Nope".into());
        assert!(matches!(
            host.create(&local),
            Err(RangekitError::UnknownSheet(_))
        ));
    }

    #[test]
    fn test_update_renames() {
        let mut host = MemoryHost::with_sheets(["Sheet1"]);
        host.create(&payload("a_", "=Sheet1!$A$1")).unwrap();
        host.create(&payload("b_", "=Sheet1!$B$1")).unwrap();

        host.update("A_", &payload("c_", "=Sheet1!$C$1")).unwrap();
        let names: Vec<_> = host.names().unwrap().into_iter().map(|r| r.name).collect();
        assert_eq!(names, vec!["b_", "c_"]);

        assert!(matches!(
            host.update("c_", &payload("B_", "=Sheet1!$C$1")),
            Err(RangekitError::NameExists(_))
        ));
        assert!(matches!(
            host.update("zz", &payload("zz", "=Sheet1!$C$1")),
            Err(RangekitError::NameNotFound(_))
        ));
    }

    #[test]
    fn test_names_report_resolution() {
        let mut host = MemoryHost::with_sheets(["Sheet1"]);
        host.create(&payload("Good", "=Sheet1!$A$1:$B$2")).unwrap();
        host.create(&payload("Gone", "=Old!$A$1")).unwrap();
        let records = host.names().unwrap();
        assert_eq!(records[0].name, "Gone");
        assert!(records[0].resolved_value.is_ref_error());
        assert_eq!(
            records[1].resolved_address.as_deref(),
            Some("Sheet1!$A$1:$B$2")
        );
    }

    #[test]
    fn test_delete_and_selection() {
        let mut host = MemoryHost::new();
        assert!(matches!(host.selection(), Err(RangekitError::NoSelection)));
        host.create(&payload("x_", "=A1")).unwrap();
        host.delete("X_").unwrap();
        assert!(matches!(
            host.delete("x_"),
            Err(RangekitError::NameNotFound(_))
        ));
    }
}
