//! Reference table reads.

use autobook_core::pipeline::{
    AccountEntry, Department, ReferenceRepository, RepositoryError, Supplier, VatType,
};
use autobook_shared::types::{OrganizationId, SupplierId};
use sea_orm::{ColumnTrait, EntityTrait, QueryFilter, QueryOrder};

use super::{PipelineRepository, convert, db_err};
use crate::entities::{chart_of_accounts, departments, suppliers, vat_types};

impl ReferenceRepository for PipelineRepository {
    async fn suppliers(&self) -> Result<Vec<Supplier>, RepositoryError> {
        let models = suppliers::Entity::find()
            .order_by_asc(suppliers::Column::SupplierName)
            .all(&self.db)
            .await
            .map_err(db_err)?;
        Ok(models.into_iter().map(convert::supplier).collect())
    }

    async fn find_supplier(&self, id: SupplierId) -> Result<Option<Supplier>, RepositoryError> {
        let model = suppliers::Entity::find_by_id(id.into_inner())
            .one(&self.db)
            .await
            .map_err(db_err)?;
        Ok(model.map(convert::supplier))
    }

    async fn vat_types(&self) -> Result<Vec<VatType>, RepositoryError> {
        let models = vat_types::Entity::find()
            .order_by_asc(vat_types::Column::Id)
            .all(&self.db)
            .await
            .map_err(db_err)?;
        Ok(models.into_iter().map(convert::vat_type).collect())
    }

    async fn chart_of_accounts(
        &self,
        organization_id: OrganizationId,
    ) -> Result<Vec<AccountEntry>, RepositoryError> {
        let models = chart_of_accounts::Entity::find()
            .filter(chart_of_accounts::Column::OrganizationId.eq(organization_id.into_inner()))
            .order_by_asc(chart_of_accounts::Column::AccountCode)
            .all(&self.db)
            .await
            .map_err(db_err)?;
        Ok(models.into_iter().map(convert::account).collect())
    }

    async fn departments(
        &self,
        organization_id: OrganizationId,
    ) -> Result<Vec<Department>, RepositoryError> {
        let models = departments::Entity::find()
            .filter(departments::Column::OrganizationId.eq(organization_id.into_inner()))
            .order_by_asc(departments::Column::DepartmentNumber)
            .all(&self.db)
            .await
            .map_err(db_err)?;
        Ok(models.into_iter().map(convert::department).collect())
    }
}
