use diesel::prelude::*;
use pushkind_common::repository::errors::{RepositoryError, RepositoryResult};

use crate::{
    domain::finance::{
        ExpenseType, FinanceExpense as DomainFinanceExpense, FinanceExpenseListQuery,
        FinanceSummary, NewFinanceExpense as DomainNewFinanceExpense,
        UpdateFinanceExpense as DomainUpdateFinanceExpense,
    },
    domain::order::DeliveryStatus,
    models::finance::{
        FinanceExpense as DbFinanceExpense, NewFinanceExpense as DbNewFinanceExpense,
        UpdateFinanceExpense as DbUpdateFinanceExpense,
    },
    models::parse_column,
    repository::{DieselRepository, FinanceReader, FinanceWriter},
};

impl FinanceReader for DieselRepository {
    fn get_expense_by_id(
        &self,
        id: i32,
        hub_id: i32,
    ) -> RepositoryResult<Option<DomainFinanceExpense>> {
        use crate::schema::finance_expenses;

        let mut conn = self.conn()?;
        let expense = finance_expenses::table
            .filter(finance_expenses::id.eq(id))
            .filter(finance_expenses::hub_id.eq(hub_id))
            .first::<DbFinanceExpense>(&mut conn)
            .optional()?;

        Ok(expense.map(DomainFinanceExpense::try_from).transpose()?)
    }

    fn list_expenses(
        &self,
        query: FinanceExpenseListQuery,
    ) -> RepositoryResult<(usize, Vec<DomainFinanceExpense>)> {
        use crate::schema::finance_expenses;

        let mut conn = self.conn()?;

        let mut count_query = finance_expenses::table
            .filter(finance_expenses::hub_id.eq(query.hub_id))
            .into_boxed::<diesel::sqlite::Sqlite>();

        if let Some(expense_type) = query.expense_type {
            count_query =
                count_query.filter(finance_expenses::expense_type.eq(expense_type.as_str()));
        }

        let total = count_query.count().get_result::<i64>(&mut conn)? as usize;

        let mut items = finance_expenses::table
            .filter(finance_expenses::hub_id.eq(query.hub_id))
            .into_boxed::<diesel::sqlite::Sqlite>();

        if let Some(expense_type) = query.expense_type {
            items = items.filter(finance_expenses::expense_type.eq(expense_type.as_str()));
        }

        items = items.order(finance_expenses::created_at.desc());

        if let Some(pagination) = &query.pagination {
            let offset = ((pagination.page.max(1) - 1) * pagination.per_page) as i64;
            let limit = pagination.per_page as i64;
            items = items.offset(offset).limit(limit);
        }

        let expenses = items
            .load::<DbFinanceExpense>(&mut conn)?
            .into_iter()
            .map(DomainFinanceExpense::try_from)
            .collect::<Result<Vec<_>, _>>()?;

        Ok((total, expenses))
    }

    fn finance_summary(&self, hub_id: i32) -> RepositoryResult<FinanceSummary> {
        use crate::schema::{finance_expenses, inventory, orders};

        let mut conn = self.conn()?;
        let mut summary = FinanceSummary::default();

        let order_totals = orders::table
            .filter(orders::hub_id.eq(hub_id))
            .filter(orders::delivery_status.ne(DeliveryStatus::Cancelled.as_str()))
            .select((
                orders::total_amount,
                orders::total_paid,
                orders::total_discount,
            ))
            .load::<(i64, i64, i64)>(&mut conn)?;

        for (amount, paid, discount) in order_totals {
            summary.sales += amount;
            summary.collected += paid;
            summary.discounts += discount;
        }

        let expenses = finance_expenses::table
            .filter(finance_expenses::hub_id.eq(hub_id))
            .select((finance_expenses::expense_type, finance_expenses::value))
            .load::<(String, i64)>(&mut conn)?;

        for (expense_type, value) in expenses {
            match parse_column::<ExpenseType>(&expense_type)? {
                ExpenseType::Purchase => summary.purchase_expenses += value,
                ExpenseType::General => summary.general_expenses += value,
            }
        }

        let receipts = inventory::table
            .filter(inventory::hub_id.eq(hub_id))
            .select((inventory::quantity_added, inventory::cost_per_unit))
            .load::<(i32, i64)>(&mut conn)?;

        summary.inventory_cost = receipts
            .into_iter()
            .map(|(quantity, cost)| i64::from(quantity) * cost)
            .sum();

        Ok(summary)
    }
}

impl FinanceWriter for DieselRepository {
    fn create_expense(
        &self,
        new_expense: &DomainNewFinanceExpense,
    ) -> RepositoryResult<DomainFinanceExpense> {
        use crate::schema::finance_expenses;

        let mut conn = self.conn()?;

        let created = diesel::insert_into(finance_expenses::table)
            .values(&DbNewFinanceExpense::from(new_expense))
            .get_result::<DbFinanceExpense>(&mut conn)?;

        Ok(DomainFinanceExpense::try_from(created)?)
    }

    fn update_expense(
        &self,
        expense_id: i32,
        hub_id: i32,
        updates: &DomainUpdateFinanceExpense,
    ) -> RepositoryResult<DomainFinanceExpense> {
        use crate::schema::finance_expenses;

        let mut conn = self.conn()?;

        let target = finance_expenses::table
            .filter(finance_expenses::id.eq(expense_id))
            .filter(finance_expenses::hub_id.eq(hub_id));

        let updated = diesel::update(target)
            .set(&DbUpdateFinanceExpense::from(updates))
            .get_result::<DbFinanceExpense>(&mut conn)
            .optional()?
            .ok_or(RepositoryError::NotFound)?;

        Ok(DomainFinanceExpense::try_from(updated)?)
    }

    fn delete_expense(&self, expense_id: i32, hub_id: i32) -> RepositoryResult<()> {
        use crate::schema::finance_expenses;

        let mut conn = self.conn()?;

        let target = finance_expenses::table
            .filter(finance_expenses::id.eq(expense_id))
            .filter(finance_expenses::hub_id.eq(hub_id));

        let deleted = diesel::delete(target).execute(&mut conn)?;
        if deleted == 0 {
            return Err(RepositoryError::NotFound);
        }

        Ok(())
    }
}
