//! Typed interfaces of the contracts resolved through the deployment registry.
use alloy_sol_types::sol;

sol! {
    #[sol(rpc)]
    contract IEntryPoint {
        #[derive(Default, Debug, PartialEq, Eq)]
        struct DepositInfo {
            uint112 deposit;
            bool staked;
            uint112 stake;
            uint32 unstakeDelaySec;
            uint48 withdrawTime;
        }

        function depositTo(address account) external payable;
        function addStake(uint32 unstakeDelaySec) external payable;
        function balanceOf(address account) external view returns (uint256);
        function getDepositInfo(address account) external view returns (DepositInfo memory info);
    }

    #[sol(rpc)]
    contract ISmartAccountFactory {
        event AccountCreation(
            address indexed account,
            address indexed initialAuthModule,
            uint256 indexed index
        );

        function getAddressForCounterFactualAccount(
            address moduleSetupContract,
            bytes calldata moduleSetupData,
            uint256 index
        ) external view returns (address _account);

        function deployCounterFactualAccount(
            address moduleSetupContract,
            bytes calldata moduleSetupData,
            uint256 index
        ) public returns (address proxy);
    }

    #[sol(rpc)]
    contract ISmartAccount {
        function entryPoint() external view returns (address);
        function isModuleEnabled(address module) external view returns (bool);
    }

    #[sol(rpc)]
    contract IEOAOwnershipRegistryModule {
        function initForSmartAccount(address eoaOwner) external returns (address);
        function getOwner(address smartAccount) external view returns (address);
    }

    #[sol(rpc)]
    contract IMockToken {
        function mint(address sender, uint256 amount) external;
        function transfer(address to, uint256 amount) external returns (bool);
        function balanceOf(address account) external view returns (uint256);
    }

    #[sol(rpc)]
    contract VerifyingSingletonPaymaster {
        constructor(address _owner, address _entryPoint, address _verifyingSigner) {}

        function addStake(uint32 unstakeDelaySec) external payable;
        function depositFor(address paymasterId) external payable;
        function getBalance(address paymasterId) external view returns (uint256 balance);
        function verifyingSigner() external view returns (address);
        function owner() external view returns (address);
    }
}
