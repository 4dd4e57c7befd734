//! Typed identifiers for every stored entity.

use crate::define_id_type;

define_id_type!(CompanyId);
define_id_type!(UserId);
define_id_type!(BinTypeId);
define_id_type!(ContaminationTypeId);
define_id_type!(FormId);
define_id_type!(FormBinId);
define_id_type!(InvitationId);
define_id_type!(SubmissionId);
