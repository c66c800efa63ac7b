//! Account page collaborators: profile form, password change, address book
//! and wishlist. Each action is a single request; local state only changes
//! after the backend accepted it.

use serde::{Deserialize, Serialize};
use shared::{
    domain::{AddressId, Notice, SkuId},
    protocol::{routes, AddressDeleteRequest, AddressUpdateRequest, FormFields, WishlistRequest},
};
use tracing::{debug, info};

use crate::{
    countries::CountryDirectory,
    error::{ActionError, FormError},
    settle, success_notice, StorefrontApi,
};

pub const CURRENT_PASSWORD_FIELD: &str = "currentPassword";
pub const NEW_PASSWORD_FIELD: &str = "newPassword";
pub const CONFIRM_PASSWORD_FIELD: &str = "confirmNewPassword";
pub const COUNTRY_FIELD: &str = "country";

/// Profile form. Read-only until `begin_edit`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AccountInfoForm {
    fields: FormFields,
    editable: bool,
}

impl AccountInfoForm {
    pub fn new(fields: FormFields) -> Self {
        Self {
            fields,
            editable: false,
        }
    }

    pub fn fields(&self) -> &FormFields {
        &self.fields
    }

    pub fn is_editable(&self) -> bool {
        self.editable
    }

    pub fn begin_edit(&mut self) {
        self.editable = true;
    }

    /// Locks the form again. Typed values stay as they are.
    pub fn cancel(&mut self) {
        self.editable = false;
    }

    pub fn set_field(&mut self, name: impl Into<String>, value: impl Into<String>) -> Result<(), FormError> {
        if !self.editable {
            return Err(FormError::ReadOnly);
        }
        self.fields.insert(name.into(), value.into());
        Ok(())
    }

    pub async fn submit(&mut self, api: &dyn StorefrontApi) -> Result<Notice, ActionError> {
        if !self.editable {
            return Err(FormError::ReadOnly.into());
        }
        let accepted = settle(routes::ACCOUNT, api.update_account(self.fields.clone()).await)?;
        for value in self.fields.values_mut() {
            let trimmed = value.trim();
            if trimmed.len() != value.len() {
                *value = trimmed.to_string();
            }
        }
        self.editable = false;
        info!("account details updated");
        Ok(success_notice(accepted.msg, "Data updated"))
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PasswordChange {
    pub current_password: String,
    pub new_password: String,
    pub confirm_new_password: String,
}

impl PasswordChange {
    pub fn new(
        current_password: impl Into<String>,
        new_password: impl Into<String>,
        confirm_new_password: impl Into<String>,
    ) -> Self {
        Self {
            current_password: current_password.into(),
            new_password: new_password.into(),
            confirm_new_password: confirm_new_password.into(),
        }
    }

    /// Same checks the backend runs, minus verifying the current password.
    pub fn validate(&self) -> Result<(), FormError> {
        if self.new_password.is_empty() {
            return Err(FormError::EmptyPassword);
        }
        if self.new_password != self.confirm_new_password {
            return Err(FormError::PasswordMismatch);
        }
        if self.new_password == self.current_password {
            return Err(FormError::PasswordUnchanged);
        }
        Ok(())
    }

    fn to_fields(&self) -> FormFields {
        FormFields::from([
            (CURRENT_PASSWORD_FIELD.to_string(), self.current_password.clone()),
            (NEW_PASSWORD_FIELD.to_string(), self.new_password.clone()),
            (CONFIRM_PASSWORD_FIELD.to_string(), self.confirm_new_password.clone()),
        ])
    }

    /// Clears the form once the backend accepted the change.
    pub async fn submit(&mut self, api: &dyn StorefrontApi) -> Result<Notice, ActionError> {
        self.validate()?;
        let accepted = settle(routes::PASSWORD_RESET, api.reset_password(self.to_fields()).await)?;
        *self = Self::default();
        info!("password changed");
        Ok(success_notice(accepted.msg, "Password changed"))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AddressEntry {
    pub id: AddressId,
    pub fields: FormFields,
}

pub struct AddressBook {
    entries: Vec<AddressEntry>,
    countries: CountryDirectory,
}

impl AddressBook {
    pub fn new(entries: Vec<AddressEntry>, countries: CountryDirectory) -> Self {
        Self { entries, countries }
    }

    pub fn entries(&self) -> &[AddressEntry] {
        &self.entries
    }

    pub fn get(&self, id: AddressId) -> Option<&AddressEntry> {
        self.entries.iter().find(|entry| entry.id == id)
    }

    /// Adds the row only when the backend reported the new id.
    pub async fn create(&mut self, api: &dyn StorefrontApi, fields: FormFields) -> Result<Notice, ActionError> {
        let accepted = settle(routes::ADDRESS, api.create_address(fields.clone()).await)?;
        if let Some(id) = accepted.extra.new_id {
            info!(addr_id = id.0, "address created");
            self.entries.push(AddressEntry { id, fields });
        }
        Ok(success_notice(accepted.msg, "New address added"))
    }

    /// The country field is free text on the form; the backend wants a code.
    pub async fn update(
        &mut self,
        api: &dyn StorefrontApi,
        id: AddressId,
        mut fields: FormFields,
    ) -> Result<Notice, ActionError> {
        if let Some(country) = fields.get_mut(COUNTRY_FIELD) {
            let code = self
                .countries
                .resolve(country)
                .ok_or_else(|| FormError::UnknownCountry(country.clone()))?;
            debug!(input = %country, code, "resolved country");
            *country = code.to_string();
        }

        let request = AddressUpdateRequest {
            addr_id: id,
            fields: fields.clone(),
        };
        let accepted = settle(routes::ADDRESS, api.update_address(request).await)?;
        if let Some(entry) = self.entries.iter_mut().find(|entry| entry.id == id) {
            entry.fields = fields;
        }
        info!(addr_id = id.0, "address updated");
        Ok(success_notice(accepted.msg, "Address updated"))
    }

    pub async fn delete(&mut self, api: &dyn StorefrontApi, id: AddressId) -> Result<Notice, ActionError> {
        let accepted = settle(
            routes::ADDRESS,
            api.delete_address(AddressDeleteRequest { addr_id: id }).await,
        )?;
        self.entries.retain(|entry| entry.id != id);
        info!(addr_id = id.0, "address deleted");
        Ok(success_notice(accepted.msg, "Address deleted"))
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WishlistToggle {
    pub notice: Notice,
    pub wish_count: Option<u32>,
}

/// Adds the item to the wishlist, or removes it when already there.
pub async fn toggle_wishlist(api: &dyn StorefrontApi, sku_id: SkuId) -> Result<WishlistToggle, ActionError> {
    let accepted = settle(routes::WISHLIST, api.toggle_wishlist(WishlistRequest { sku_id }).await)?;
    debug!(sku_id = sku_id.0, wish_count = ?accepted.extra.wish_count, "wishlist toggled");
    Ok(WishlistToggle {
        notice: success_notice(accepted.msg, "Wishlist updated"),
        wish_count: accepted.extra.wish_count,
    })
}

/// The account wishlist table. Toggling an item here removes its row.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WishlistPage {
    items: Vec<SkuId>,
    wish_count: Option<u32>,
}

impl WishlistPage {
    pub fn new(items: Vec<SkuId>) -> Self {
        Self {
            items,
            wish_count: None,
        }
    }

    pub fn items(&self) -> &[SkuId] {
        &self.items
    }

    pub fn wish_count(&self) -> Option<u32> {
        self.wish_count
    }

    pub async fn remove(&mut self, api: &dyn StorefrontApi, sku_id: SkuId) -> Result<Notice, ActionError> {
        let toggle = toggle_wishlist(api, sku_id).await?;
        self.items.retain(|item| *item != sku_id);
        self.wish_count = toggle.wish_count;
        Ok(toggle.notice)
    }
}

#[cfg(test)]
#[path = "tests/account_tests.rs"]
mod tests;
